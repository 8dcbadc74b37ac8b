//! 运行时错误.
//!
//! 分两类:
//!
//! 1. 可恢复的单项错误 ([`LoadError`], [`SelectError`], 以及非致命的 [`InferenceError`]),
//!   在批处理边界被转换为 [`ItemError`], 不再向外传播;
//! 2. 致命错误 ([`FatalError`], [`StartupError`]), 表明程序契约被破坏或启动条件不满足,
//!   会终止整个运行.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 读取单个 DICOM 文件的错误.
#[derive(Debug, Error)]
pub enum LoadError {
    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 不是可识别的 DICOM 容器 (找不到 `DICM` 魔数).
    #[error("not a DICOM file: missing DICM magic")]
    NotDicom,

    /// 是 DICOM 容器, 但内容无法解析或像素无法解码.
    #[error("unreadable DICOM content: {0}")]
    Corrupt(String),

    /// 必需的标识或排序属性缺失 (或无法转换).
    #[error("missing or invalid DICOM attribute {tag}")]
    MissingMetadata {
        /// 属性关键字, 如 `SeriesInstanceUID`.
        tag: &'static str,
    },

    /// 像素布局不受支持 (如多采样彩色图像).
    #[error("unsupported pixel layout: {0}")]
    UnsupportedLayout(String),
}

impl LoadError {
    /// 文件无法作为 DICOM 解析 (无魔数, 或有魔数但内容损坏). 选片时这类文件被跳过.
    #[inline]
    pub fn is_unparsable(&self) -> bool {
        matches!(self, Self::NotDicom | Self::Corrupt(_))
    }
}

/// 中心切片选取错误.
#[derive(Debug, Error)]
pub enum SelectError {
    /// 无法列出序列目录.
    #[error("cannot list series directory '{}': {source}", location.display())]
    ReadDir {
        /// 序列位置.
        location: PathBuf,
        /// 底层错误.
        source: io::Error,
    },

    /// 序列目录下没有任何可读的 DICOM 切片.
    #[error("no valid DICOM slices in '{}'", location.display())]
    NoValidSlices {
        /// 序列位置.
        location: PathBuf,
    },

    /// 某个 DICOM 切片可解析但不可用 (缺少 InstanceNumber 或无法读取).
    #[error("bad slice '{}': {source}", path.display())]
    Slice {
        /// 切片路径.
        path: PathBuf,
        /// 底层错误.
        source: LoadError,
    },
}

/// 推理错误.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// 输入张量形状与模型期望不符. 说明预处理与模型不同步, 属于致命错误.
    #[error("input tensor shape {found:?} does not match model input {expected:?}")]
    ShapeMismatch {
        /// 模型期望的形状 (不含 batch 维).
        expected: Vec<usize>,
        /// 实际形状.
        found: Vec<usize>,
    },

    /// 模型输出不是 `[1, 2]` 的 logits. 同样属于致命错误.
    #[error("model produced unexpected output of shape {shape:?}")]
    UnexpectedOutput {
        /// 实际输出形状.
        shape: Vec<i64>,
    },

    /// 单次前向计算失败.
    #[error("ONNX Runtime error: {0}")]
    Runtime(#[from] ort::Error),
}

impl InferenceError {
    /// 是否为致命错误.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ShapeMismatch { .. } | Self::UnexpectedOutput { .. }
        )
    }
}

/// 启动错误. 发生时进程不会开始提供服务或处理批次.
#[derive(Debug, Error)]
pub enum StartupError {
    /// 模型权重文件不存在.
    #[error("model weights not found at '{}'", .0.display())]
    ModelNotFound(PathBuf),

    /// 模型无法加载.
    #[error("failed to load model '{}': {source}", path.display())]
    Ort {
        /// 模型路径.
        path: PathBuf,
        /// 底层错误.
        source: ort::Error,
    },

    /// 模型的输入或输出签名不可用.
    #[error("model '{}' has no {what}", path.display())]
    Signature {
        /// 模型路径.
        path: PathBuf,
        /// 缺失的部分.
        what: &'static str,
    },

    /// 请求的计算设备不可用.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// 单项处理链路中可能出现的所有错误.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 读取错误.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// 切片选取错误.
    #[error(transparent)]
    Select(#[from] SelectError),

    /// 推理错误.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PipelineError {
    /// 是否为致命错误.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Inference(e) => e.is_fatal(),
            _ => false,
        }
    }

    /// 拆分致命与可恢复错误. 可恢复时返回 `Ok(ItemError)`, 致命时返回 `Err`.
    pub fn into_item(self) -> Result<ItemError, InferenceError> {
        match self {
            Self::Inference(e) if e.is_fatal() => Err(e),
            other => Ok(ItemError(other)),
        }
    }
}

/// 可恢复的单项错误.
///
/// 只能通过 [`PipelineError::into_item`] 构造, 因此一定不含致命错误.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ItemError(PipelineError);

/// 致命错误, 携带出错项的标识.
#[derive(Debug, Error)]
#[error("fatal error while processing '{item}': {source}")]
pub struct FatalError {
    /// 出错项 (文件序号或序列路径).
    pub item: String,

    /// 底层错误.
    pub source: InferenceError,
}
