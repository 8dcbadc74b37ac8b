//! 程序运行函数.

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;

use anyhow::Context;
use brain_berry::batch::{classify_series, SeriesPrediction};
use brain_berry::error::FatalError;
use brain_berry::infer::{Classifier, ClassifierConfig, OnnxClassifier};
use brain_berry::series::{parse_manifest, SeriesInput};
use brain_berry::sink::{CsvSink, SeriesSummary};
use brain_berry::{save_preview, DisplayWindow};
use either::Either;
use log::{error, info, warn};

use crate::cli::Args;

/// 按参数解析出待处理的序列.
pub fn load_inputs(args: &Args) -> anyhow::Result<Vec<SeriesInput>> {
    match args.source() {
        Either::Left(manifest) => {
            let file = File::open(manifest)
                .with_context(|| format!("cannot open series list '{}'", manifest.display()))?;
            parse_manifest(BufReader::new(file))
                .with_context(|| format!("cannot read series list '{}'", manifest.display()))
        }
        Either::Right(dirs) => Ok(dirs.iter().map(SeriesInput::new).collect()),
    }
}

/// 把被选中的切片保存为预览图. 失败只记录日志.
fn save_slice_preview(dir: &Path, p: &SeriesPrediction) {
    let path = dir.join(format!("{}.png", p.series_instance_uid()));
    let saved = p.slice().pixel_array().map_err(anyhow::Error::from).and_then(|pixels| {
        let window = DisplayWindow::from_dicom(p.slice(), pixels.view())
            .context("no usable display window")?;
        save_preview(pixels.view(), &window, &path)?;
        Ok(())
    });
    match saved {
        Ok(()) => info!("Saved preview '{}'", path.display()),
        Err(e) => warn!("Cannot save preview for series '{}': {e:#}", p.dir_path()),
    }
}

/// 以给定的分类器处理 `inputs`.
///
/// 每个成功的序列立即写入 `csv` (若有). 某一行写入失败只记录日志, 其余序列照常分类和写入,
/// 汇总结果不受 CSV 输出影响. 只有致命错误会返回 `Err`.
pub fn run_with<C, W>(
    classifier: &C,
    inputs: &[SeriesInput],
    mut csv: Option<CsvSink<W>>,
    preview_dir: Option<&Path>,
) -> Result<SeriesSummary, FatalError>
where
    C: Classifier + ?Sized,
    W: Write,
{
    classify_series(classifier, inputs, |p| {
        info!(
            "Series '{}' ({}) -> {} via '{}'",
            p.dir_path(),
            p.series_instance_uid(),
            p.label(),
            p.slice_path().display()
        );
        if let Some(dir) = preview_dir {
            save_slice_preview(dir, p);
        }
        if let Some(sink) = csv.as_mut() {
            if let Err(e) = sink.write_row(&p.to_row()) {
                error!("Cannot write CSV row for series '{}': {e}", p.dir_path());
            }
        }
    })
}

/// 实际运行. 返回成功序列的汇总.
pub fn run(args: &Args) -> anyhow::Result<SeriesSummary> {
    let inputs = load_inputs(args)?;

    let config = ClassifierConfig::new(utils::resolve_model_path(args.model.clone()))
        .with_device(args.device);
    let classifier = OnnxClassifier::new(&config)?;

    let csv = match &args.csv_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create CSV file '{}'", path.display()))?;
            Some(CsvSink::new(file)?)
        }
        None => None,
    };
    if let Some(dir) = &args.preview_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create preview directory '{}'", dir.display()))?;
    }

    info!("Classifying {} series...", inputs.len());
    let summary = run_with(&classifier, &inputs, csv, args.preview_dir.as_deref())?;
    info!("{} of {} series classified", summary.len(), inputs.len());
    Ok(summary)
}
