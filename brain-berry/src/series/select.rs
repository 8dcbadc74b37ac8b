//! 中心切片选取.
//!
//! 横断面切片沿空间轴编号. 取 InstanceNumber 的 **下中位数** 对应的切片作为整个序列的代表:
//! 奇数个时取正中间; 偶数个时取两个中间值中较小的那个, 而不是二者的平均.

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::{debug, warn};

use super::SeriesInput;
use crate::error::SelectError;
use crate::{DicomSlice, InstanceNumber};

/// 取有序映射中键的下中位数对应的项. 映射为空时返回 `None`.
pub fn lower_median<T>(map: BTreeMap<InstanceNumber, T>) -> Option<(InstanceNumber, T)> {
    let n = map.len();
    if n == 0 {
        return None;
    }
    map.into_iter().nth((n - 1) / 2)
}

/// 从 `(InstanceNumber, 切片)` 序列中选出下中位数对应的切片.
///
/// # 重复键
///
/// 若多个切片共享同一 InstanceNumber, 则按 `entries` 的迭代顺序 **后出现者覆盖先出现者**,
/// 并记录一条警告. 中位数在去重后的键集合上计算.
/// 调用方应保证 `entries` 的顺序是确定的 (见 [`SeriesInput::members`]).
pub fn select_lower_median<T, I>(entries: I) -> Option<(InstanceNumber, T)>
where
    T: std::fmt::Debug,
    I: IntoIterator<Item = (InstanceNumber, T)>,
{
    let mut map = BTreeMap::new();
    for (number, item) in entries {
        if let Some(prev) = map.insert(number, item) {
            warn!("InstanceNumber {number} is shared; {prev:?} is replaced by a later slice");
        }
    }
    lower_median(map)
}

/// 选取序列 `series` 的中心切片, 返回其路径.
///
/// 1. 只读取每个成员文件的头部;
/// 2. 不是 DICOM 或无法解析的文件记录日志后跳过;
/// 3. 可解析但缺少 InstanceNumber 的文件使整个序列失败;
/// 4. 没有任何候选时返回 [`SelectError::NoValidSlices`].
pub fn select_central_slice(series: &SeriesInput) -> Result<PathBuf, SelectError> {
    let mut entries = Vec::new();
    for path in series.members()? {
        match DicomSlice::open_header(&path).and_then(|s| s.instance_number()) {
            Ok(number) => entries.push((number, path)),
            Err(e) if e.is_unparsable() => {
                warn!("Skipping '{}': {e}", path.display());
            }
            Err(source) => return Err(SelectError::Slice { path, source }),
        }
    }

    let (number, path) =
        select_lower_median(entries).ok_or_else(|| SelectError::NoValidSlices {
            location: series.location().to_owned(),
        })?;
    debug!(
        "Selected '{}' (InstanceNumber {number}) for series '{}'",
        path.display(),
        series.dir_path()
    );
    Ok(path)
}
