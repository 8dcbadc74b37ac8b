use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::consts::{MODEL_INPUT_CHANNELS, MODEL_INPUT_SIDE};

/// 计算设备.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Device {
    /// 仅使用 CPU.
    Cpu,

    /// 若以 `cuda` feature 构建则优先使用 GPU 0, 不可用时退回 CPU.
    #[default]
    Auto,

    /// 指定的 CUDA 设备. 不可用时启动失败.
    Cuda(i32),
}

impl FromStr for Device {
    type Err = String;

    /// 接受 `cpu`, `auto`, `cuda`, `cuda:N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "auto" => Ok(Self::Auto),
            "cuda" => Ok(Self::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|id| id.parse().ok())
                .map(Self::Cuda)
                .ok_or_else(|| format!("unknown device `{s}`, expected cpu, auto, cuda or cuda:N")),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Auto => write!(f, "auto"),
            Self::Cuda(id) => write!(f, "cuda:{id}"),
        }
    }
}

/// 分类器的不可变配置. 在启动时一次性确定, 显式传给构造函数.
#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    model_path: PathBuf,
    device: Device,
    input_name: Option<String>,
    expected_input: [usize; 3],
}

impl ClassifierConfig {
    /// 以模型路径构造, 其余取默认值: 自动选择设备, 使用模型的第一个输入,
    /// 期望输入形状 `1 × 256 × 256`.
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            device: Device::default(),
            input_name: None,
            expected_input: [MODEL_INPUT_CHANNELS, MODEL_INPUT_SIDE, MODEL_INPUT_SIDE],
        }
    }

    /// 指定设备.
    #[inline]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// 指定模型输入名.
    #[inline]
    pub fn with_input_name<S: Into<String>>(mut self, name: S) -> Self {
        self.input_name = Some(name.into());
        self
    }

    /// 模型路径.
    #[inline]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// 设备.
    #[inline]
    pub fn device(&self) -> Device {
        self.device
    }

    /// 指定的模型输入名.
    #[inline]
    pub fn input_name(&self) -> Option<&str> {
        self.input_name.as_deref()
    }

    /// 期望的输入形状 `(通道, 高, 宽)`, 不含 batch 维.
    #[inline]
    pub fn expected_input(&self) -> [usize; 3] {
        self.expected_input
    }
}
