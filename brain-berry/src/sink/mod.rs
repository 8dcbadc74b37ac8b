//! 结果输出.
//!
//! 单图模式输出 JSON 数组; 序列模式逐行输出 CSV, 并在结束时输出一个汇总 JSON 对象.
//! 内部的 [`Outcome`](crate::batch::Outcome) 只在这里被展开为可空字段.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::batch::PredictionRecord;
use crate::consts::CSV_COLUMNS;
use crate::infer::ClassLabel;

/// 单图模式的响应项.
///
/// `prediction` 总会出现 (失败时为 `null`); `error_msg` 只在失败时出现.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImagePrediction {
    /// 所属序列标识.
    pub series_instance_uid: Option<String>,

    /// 影像标识.
    pub sop_instance_uid: Option<String>,

    /// 类别.
    pub prediction: Option<ClassLabel>,

    /// 错误描述.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl From<&PredictionRecord> for ImagePrediction {
    fn from(r: &PredictionRecord) -> Self {
        Self {
            series_instance_uid: r.series_instance_uid().map(str::to_string),
            sop_instance_uid: r.item_identity().map(str::to_string),
            prediction: r.prediction(),
            error_msg: r.error_message().map(str::to_string),
        }
    }
}

/// 序列模式的 CSV 行.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    /// 序列标识.
    pub series_instance_uid: String,

    /// 序列目录.
    pub dir_path: String,

    /// 类别.
    pub prediction: ClassLabel,
}

/// 逐行写出 [`SeriesRow`] 的 CSV 输出.
///
/// 表头在构造时写出 (即使之后一行也没有), 每写一行就刷新一次,
/// 因此进程中途退出时已完成的行不会丢失.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// 在 `w` 上创建输出并写出表头.
    pub fn new(w: W) -> csv::Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(w);
        writer.write_record(CSV_COLUMNS)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// 写一行并刷新.
    pub fn write_row(&mut self, row: &SeriesRow) -> csv::Result<()> {
        self.writer.serialize(row)?;
        self.writer.flush()?;
        Ok(())
    }

    /// 取回底层写入器.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))
    }
}

/// 读回 [`CsvSink`] 写出的内容.
pub fn read_rows<R: Read>(r: R) -> csv::Result<Vec<SeriesRow>> {
    csv::Reader::from_reader(r).deserialize().collect()
}

/// 序列汇总中的一项.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    /// 类别.
    pub prediction: ClassLabel,
}

/// 序列模式的汇总: `dir_path -> {"prediction": n}`, 只包含成功的序列.
///
/// 键按字典序排列, 同一键后写者覆盖先写者.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesSummary(BTreeMap<String, SeriesEntry>);

impl SeriesSummary {
    /// 写入一项.
    pub fn insert<S: Into<String>>(&mut self, dir_path: S, prediction: ClassLabel) {
        self.0.insert(dir_path.into(), SeriesEntry { prediction });
    }

    /// 查找一项.
    #[inline]
    pub fn get(&self, dir_path: &str) -> Option<ClassLabel> {
        self.0.get(dir_path).map(|e| e.prediction)
    }

    /// 项数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 序列化为单行 JSON 对象.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Outcome;

    fn row(uid: &str, dir: &str, label: ClassLabel) -> SeriesRow {
        SeriesRow {
            series_instance_uid: uid.into(),
            dir_path: dir.into(),
            prediction: label,
        }
    }

    #[test]
    fn test_image_prediction_json_shape() {
        let ok = PredictionRecord::new(
            Some("1.2.3".into()),
            Some("1.2.3.4".into()),
            Outcome::Succeeded(ClassLabel::Brain),
        );
        let v = serde_json::to_value(ImagePrediction::from(&ok)).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "series_instance_uid": "1.2.3",
                "sop_instance_uid": "1.2.3.4",
                "prediction": 1
            })
        );

        let bad = PredictionRecord::new(None, None, Outcome::Failed("bad file".into()));
        let v = serde_json::to_value(ImagePrediction::from(&bad)).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "series_instance_uid": null,
                "sop_instance_uid": null,
                "prediction": null,
                "error_msg": "bad file"
            })
        );
    }

    #[test]
    fn test_csv_header_written_without_rows() {
        let sink = CsvSink::new(Vec::new()).unwrap();
        let out = sink.into_inner().unwrap();
        assert_eq!(out, b"series_instance_uid,dir_path,prediction\n");
    }

    #[test]
    fn test_csv_round_trip() {
        let r = row("1.2.840.1", "data/s1", ClassLabel::Brain);

        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.write_row(&r).unwrap();
        sink.write_row(&row("9.9", "data/s3", ClassLabel::NonBrain))
            .unwrap();
        let out = sink.into_inner().unwrap();

        let text = String::from_utf8(out.clone()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[1], "1.2.840.1,data/s1,1");
        assert!(lines[2].ends_with(",0"));

        let back = read_rows(out.as_slice()).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0], r);
        assert_eq!(back[0].prediction, ClassLabel::Brain);
    }

    #[test]
    fn test_summary_json_last_write_wins() {
        let mut s = SeriesSummary::default();
        s.insert("b/s2", ClassLabel::NonBrain);
        s.insert("a/s1", ClassLabel::Brain);
        s.insert("b/s2", ClassLabel::Brain);
        assert_eq!(s.len(), 2);
        assert_eq!(s.get("b/s2"), Some(ClassLabel::Brain));
        assert_eq!(
            s.to_json().unwrap(),
            r#"{"a/s1":{"prediction":1},"b/s2":{"prediction":1}}"#
        );
    }

    #[test]
    fn test_empty_summary_json() {
        assert_eq!(SeriesSummary::default().to_json().unwrap(), "{}");
    }
}
