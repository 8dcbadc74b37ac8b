//! 命令行参数.

use std::path::{Path, PathBuf};

use brain_berry::infer::Device;
use clap::{ArgGroup, Parser};
use either::Either;

/// 把 MRI 序列分为脑部 / 非脑部.
///
/// 每个序列目录取中心切片 (InstanceNumber 的下中位数) 分类. 结束时在标准输出打印
/// `{"<dir_path>": {"prediction": n}, ...}`, 只包含成功的序列; 失败的序列记录日志后跳过.
#[derive(Debug, Parser)]
#[command(name = "classify-series", version)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["series_paths_file", "series_dirs"]),
))]
pub struct Args {
    /// 列出序列目录的文本文件, 每行一个路径
    #[arg(long, value_name = "FILE")]
    pub series_paths_file: Option<PathBuf>,

    /// 一个或多个序列目录
    #[arg(long, value_name = "DIR", num_args = 1..)]
    pub series_dirs: Vec<PathBuf>,

    /// 逐行写出结果的 CSV 文件
    #[arg(long, value_name = "FILE")]
    pub csv_file: Option<PathBuf>,

    /// 关闭日志输出
    #[arg(short, long)]
    pub quiet: bool,

    /// 模型权重路径 [默认: $BRAIN_BERRY_MODEL 或 ./model_weight/best_metric_model.onnx]
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// 计算设备: cpu, auto, cuda 或 cuda:N
    #[arg(long, default_value_t = Device::Auto)]
    pub device: Device,

    /// 把被选中的切片保存为 `<SeriesInstanceUID>.png` 的目录
    #[arg(long, value_name = "DIR")]
    pub preview_dir: Option<PathBuf>,
}

impl Args {
    /// 序列来源: 清单文件, 或直接给出的目录.
    pub fn source(&self) -> Either<&Path, &[PathBuf]> {
        match &self.series_paths_file {
            Some(file) => Either::Left(file.as_path()),
            None => Either::Right(self.series_dirs.as_slice()),
        }
    }
}
