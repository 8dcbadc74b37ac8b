//! 序列输入.
//!
//! 一个序列即一个目录, 目录下的普通文件被认为属于同一序列.
//! 成员文件在需要时才列出.

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use crate::error::SelectError;

mod select;

pub use select::{lower_median, select_central_slice, select_lower_median};

/// 一个待分类的序列目录.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SeriesInput {
    location: PathBuf,
}

impl SeriesInput {
    /// 由目录路径构造. 路径会按组件重新拼接 (去掉末尾的 `/` 和中间的 `.`),
    /// 使同一目录的不同写法得到相同的标识.
    pub fn new<P: AsRef<Path>>(location: P) -> Self {
        Self {
            location: location.as_ref().components().collect(),
        }
    }

    /// 序列目录.
    #[inline]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// 序列目录的字符串形式, 作为序列模式的结果键.
    #[inline]
    pub fn dir_path(&self) -> String {
        self.location.display().to_string()
    }

    /// 列出目录下所有普通文件 (不递归), 按文件名升序排列.
    ///
    /// 固定的顺序保证了同名 InstanceNumber 冲突时的选择是确定的.
    pub fn members(&self) -> Result<Vec<PathBuf>, SelectError> {
        let read_dir_err = |source| SelectError::ReadDir {
            location: self.location.clone(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.location).map_err(read_dir_err)? {
            let path = entry.map_err(read_dir_err)?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// 解析序列清单: 每行一个序列目录路径.
///
/// 行尾的 `\n` / `\r\n` 会被去掉, 空行被跳过. 其余内容 (包括首尾空格) 按原样保留.
pub fn parse_manifest<R: BufRead>(reader: R) -> io::Result<Vec<SeriesInput>> {
    let mut ans = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if !line.is_empty() {
            ans.push(SeriesInput::new(line));
        }
    }
    Ok(ans)
}
