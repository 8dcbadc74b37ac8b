//! 批处理编排.
//!
//! 两种模式逐项、顺序地执行 "读取 → (选片) → 预处理 → 推理", 并遵守同一条规则:
//! 单项的可恢复错误不会中断批次. 二者的区别只在于失败项的去留, 由 [`FailurePolicy`] 显式给出:
//!
//! | 模式 | 入口 | 失败项 |
//! |:---:|:---:|:---:|
//! | 单图 | [`classify_images`] | [`FailurePolicy::Record`], 产生一条错误记录 |
//! | 序列 | [`classify_series`] | [`FailurePolicy::Omit`], 记录日志后丢弃 |
//!
//! 致命错误 (见 [`crate::error::FatalError`]) 不在逐项边界被捕获, 会立即终止整个批次.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};

use crate::error::{FatalError, ItemError, PipelineError};
use crate::infer::{ClassLabel, Classifier};
use crate::series::{select_central_slice, SeriesInput};
use crate::sink::{SeriesRow, SeriesSummary};
use crate::transform::preprocess;
use crate::{DicomSlice, ImageRecord};

mod record;

pub use record::{Outcome, PredictionRecord};

/// 失败项的处置方式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FailurePolicy {
    /// 失败项也产生一条记录, 汇总结果与输入一一对应.
    Record,

    /// 失败项只记录日志, 不出现在汇总结果中.
    Omit,
}

impl FailurePolicy {
    /// `settled` 是否应出现在汇总结果中.
    #[inline]
    pub fn admits<T>(self, settled: &Settled<T>) -> bool {
        match settled {
            Settled::Succeeded(_) => true,
            Settled::Failed(_) => self == Self::Record,
        }
    }
}

/// 单项处理的终态.
#[derive(Debug)]
pub enum Settled<T> {
    /// 成功.
    Succeeded(T),

    /// 可恢复的失败.
    Failed(ItemError),
}

impl<T> Settled<T> {
    /// 把链路结果拆分为终态或致命错误. `item` 仅在致命时用于标识出错项.
    pub fn settle<S: Display>(result: Result<T, PipelineError>, item: S) -> Result<Self, FatalError> {
        match result {
            Ok(v) => Ok(Self::Succeeded(v)),
            Err(e) => e
                .into_item()
                .map(Self::Failed)
                .map_err(|source| FatalError {
                    item: item.to_string(),
                    source,
                }),
        }
    }

    /// 是否成功.
    #[inline]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// 单图模式下的失败处置.
const IMAGE_POLICY: FailurePolicy = FailurePolicy::Record;

/// 序列模式下的失败处置.
const SERIES_POLICY: FailurePolicy = FailurePolicy::Omit;

/// 单张影像在出错前已读到的标识.
#[derive(Debug, Default)]
struct Identity {
    series_instance_uid: Option<String>,
    sop_instance_uid: Option<String>,
}

fn classify_image<C: Classifier + ?Sized>(
    classifier: &C,
    bytes: &[u8],
    id: &mut Identity,
) -> Result<ClassLabel, PipelineError> {
    let slice = DicomSlice::from_bytes(bytes)?;
    id.series_instance_uid = Some(slice.series_instance_uid()?);
    id.sop_instance_uid = Some(slice.sop_instance_uid()?);
    let record = ImageRecord::from_slice(&slice)?;
    debug!(
        "Decoded {}/{} ({}×{})",
        record.series_id(),
        record.instance_id(),
        record.shape().0,
        record.shape().1
    );
    let tensor = preprocess(record.into_pixels());
    Ok(classifier.classify(&tensor)?)
}

/// 单图模式: 逐个分类上传的 DICOM 字节流.
///
/// 返回的记录与 `uploads` 一一对应且顺序相同; 某个文件无法解码、缺少标识或推理失败时,
/// 对应记录带有错误描述, 其余文件照常处理. 空输入得到空列表.
///
/// 只有致命错误会返回 `Err`.
pub fn classify_images<C, B>(classifier: &C, uploads: &[B]) -> Result<Vec<PredictionRecord>, FatalError>
where
    C: Classifier + ?Sized,
    B: AsRef<[u8]>,
{
    let mut records = Vec::with_capacity(uploads.len());
    for (i, upload) in uploads.iter().enumerate() {
        let mut id = Identity::default();
        let result = classify_image(classifier, upload.as_ref(), &mut id);
        let item = id
            .sop_instance_uid
            .clone()
            .unwrap_or_else(|| format!("upload #{}", i + 1));
        let settled = Settled::settle(result, &item)?;

        match &settled {
            Settled::Succeeded(label) => debug!("Upload #{} ({item}) -> {label}", i + 1),
            Settled::Failed(e) => warn!("Upload #{} ({item}) failed: {e}", i + 1),
        }
        if IMAGE_POLICY.admits(&settled) {
            records.push(PredictionRecord::new(
                id.series_instance_uid,
                id.sop_instance_uid,
                settled.into(),
            ));
        }
    }
    Ok(records)
}

/// 一个成功分类的序列.
#[derive(Debug, Clone)]
pub struct SeriesPrediction {
    series_instance_uid: String,
    dir_path: String,
    label: ClassLabel,
    slice_path: PathBuf,
    slice: DicomSlice,
}

impl SeriesPrediction {
    /// 序列标识, 取自被选中的切片.
    #[inline]
    pub fn series_instance_uid(&self) -> &str {
        &self.series_instance_uid
    }

    /// 序列目录.
    #[inline]
    pub fn dir_path(&self) -> &str {
        &self.dir_path
    }

    /// 类别.
    #[inline]
    pub fn label(&self) -> ClassLabel {
        self.label
    }

    /// 被选中切片的路径.
    #[inline]
    pub fn slice_path(&self) -> &Path {
        &self.slice_path
    }

    /// 被选中的切片. 可用于生成预览.
    #[inline]
    pub fn slice(&self) -> &DicomSlice {
        &self.slice
    }

    /// 转换为 CSV 行.
    pub fn to_row(&self) -> SeriesRow {
        SeriesRow {
            series_instance_uid: self.series_instance_uid.clone(),
            dir_path: self.dir_path.clone(),
            prediction: self.label,
        }
    }
}

fn classify_one_series<C: Classifier + ?Sized>(
    classifier: &C,
    input: &SeriesInput,
) -> Result<SeriesPrediction, PipelineError> {
    let slice_path = select_central_slice(input)?;
    let slice = DicomSlice::open(&slice_path)?;
    let series_instance_uid = slice.series_instance_uid()?;
    let tensor = preprocess(slice.pixel_array()?);
    let label = classifier.classify(&tensor)?;
    Ok(SeriesPrediction {
        series_instance_uid,
        dir_path: input.dir_path(),
        label,
        slice_path,
        slice,
    })
}

/// 序列模式: 对每个序列选取中心切片并分类.
///
/// 每个成功的序列先交给 `on_success` (例如逐行写 CSV), 再写入汇总; 失败的序列记录
/// `error` 日志后被跳过, 不出现在汇总中. 同一目录出现多次时, 后者覆盖前者.
///
/// 只有致命错误会返回 `Err`.
pub fn classify_series<C, F>(
    classifier: &C,
    inputs: &[SeriesInput],
    mut on_success: F,
) -> Result<SeriesSummary, FatalError>
where
    C: Classifier + ?Sized,
    F: FnMut(&SeriesPrediction),
{
    let mut summary = SeriesSummary::default();
    for input in inputs {
        let dir_path = input.dir_path();
        debug!("Predicting series '{dir_path}'");

        let settled = Settled::settle(classify_one_series(classifier, input), &dir_path)?;
        if let Settled::Failed(e) = &settled {
            error!("Error predicting series '{dir_path}': {e}");
        }
        if !SERIES_POLICY.admits(&settled) {
            continue;
        }
        if let Settled::Succeeded(prediction) = settled {
            on_success(&prediction);
            summary.insert(prediction.dir_path, prediction.label);
        }
    }
    Ok(summary)
}
