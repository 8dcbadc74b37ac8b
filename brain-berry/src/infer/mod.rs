//! 推理适配层.
//!
//! 分类器本身是黑盒: 输入预处理后的张量, 输出类别. [`Classifier`] 是它与批处理之间的接缝,
//! 生产实现为基于 ONNX Runtime 的 [`OnnxClassifier`].

use std::cmp::Reverse;
use std::fmt;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;
use crate::transform::Tensor;

mod config;
mod onnx;

pub use config::{ClassifierConfig, Device};
pub use onnx::OnnxClassifier;

/// 分类结果.
///
/// 下标与类别的对应关系由训练时约定, 不能从本流程推导出来.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ClassLabel {
    /// 非脑部, 下标 0.
    NonBrain,

    /// 脑部, 下标 1.
    Brain,
}

impl ClassLabel {
    /// 类别下标.
    #[inline]
    pub const fn index(self) -> u8 {
        match self {
            Self::NonBrain => 0,
            Self::Brain => 1,
        }
    }

    /// 由下标得到类别. 越界时返回 `None`.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::NonBrain),
            1 => Some(Self::Brain),
            _ => None,
        }
    }
}

impl From<ClassLabel> for u8 {
    #[inline]
    fn from(label: ClassLabel) -> u8 {
        label.index()
    }
}

/// 非法类别下标.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct InvalidLabel(pub u8);

impl fmt::Display for InvalidLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid class label {}, expected 0 or 1", self.0)
    }
}

impl TryFrom<u8> for ClassLabel {
    type Error = InvalidLabel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value as usize).ok_or(InvalidLabel(value))
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// 得分最高者的下标. 并列时取第一个, 与常见张量库的 argmax 一致.
/// `scores` 为空时返回 `None`.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .position_min_by_key(|&&s| Reverse(OrderedFloat(s)))
}

/// 黑盒分类器.
///
/// 实现者在进程启动时构建一次, 之后以只读方式被所有调用方共享.
pub trait Classifier: Send + Sync {
    /// 对一张预处理后的张量 `(通道, 高, 宽)` 分类.
    ///
    /// 形状与模型不符时返回 [`InferenceError::ShapeMismatch`], 这是致命错误.
    fn classify(&self, input: &Tensor) -> Result<ClassLabel, InferenceError>;
}

/// 以闭包充当分类器. 便于测试或接入其他后端.
pub struct FnClassifier<F>(pub F);

impl<F> Classifier for FnClassifier<F>
where
    F: Fn(&Tensor) -> Result<ClassLabel, InferenceError> + Send + Sync,
{
    #[inline]
    fn classify(&self, input: &Tensor) -> Result<ClassLabel, InferenceError> {
        (self.0)(input)
    }
}

impl<C: Classifier + ?Sized> Classifier for std::sync::Arc<C> {
    #[inline]
    fn classify(&self, input: &Tensor) -> Result<ClassLabel, InferenceError> {
        (**self).classify(input)
    }
}
