use crate::infer::ClassLabel;

use super::Settled;

/// 单项的最终结果: 要么是类别, 要么是错误描述, 二者恰有其一.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Outcome {
    /// 分类成功.
    Succeeded(ClassLabel),

    /// 处理失败, 携带错误描述.
    Failed(String),
}

impl Outcome {
    /// 类别. 失败时为 `None`.
    #[inline]
    pub fn prediction(&self) -> Option<ClassLabel> {
        match self {
            Self::Succeeded(label) => Some(*label),
            Self::Failed(_) => None,
        }
    }

    /// 错误描述. 成功时为 `None`.
    #[inline]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed(msg) => Some(msg),
        }
    }
}

impl From<Settled<ClassLabel>> for Outcome {
    fn from(settled: Settled<ClassLabel>) -> Self {
        match settled {
            Settled::Succeeded(label) => Self::Succeeded(label),
            Settled::Failed(e) => Self::Failed(e.to_string()),
        }
    }
}

/// 一条预测记录.
///
/// 标识字段在出错前读到多少就保留多少, 因此失败记录也可能带有标识.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PredictionRecord {
    series_instance_uid: Option<String>,
    item_identity: Option<String>,
    outcome: Outcome,
}

impl PredictionRecord {
    /// 构造.
    pub fn new(
        series_instance_uid: Option<String>,
        item_identity: Option<String>,
        outcome: Outcome,
    ) -> Self {
        Self {
            series_instance_uid,
            item_identity,
            outcome,
        }
    }

    /// 所属序列标识.
    #[inline]
    pub fn series_instance_uid(&self) -> Option<&str> {
        self.series_instance_uid.as_deref()
    }

    /// 单项标识. 单图模式下为 SOPInstanceUID.
    #[inline]
    pub fn item_identity(&self) -> Option<&str> {
        self.item_identity.as_deref()
    }

    /// 结果.
    #[inline]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// 类别. 失败时为 `None`.
    #[inline]
    pub fn prediction(&self) -> Option<ClassLabel> {
        self.outcome.prediction()
    }

    /// 错误描述. 成功时为 `None`.
    #[inline]
    pub fn error_message(&self) -> Option<&str> {
        self.outcome.error_message()
    }
}
