//! 集成测试共用的合成 DICOM 数据.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use brain_berry::error::InferenceError;
use brain_berry::infer::{ClassLabel, Classifier, FnClassifier};
use brain_berry::transform::Tensor;
use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_dictionary_std::{tags, uids};
use dicom_object::{DefaultDicomObject, FileMetaTableBuilder, InMemDicomObject};

/// 合成切片的边长.
pub const SIDE: u16 = 16;

/// 一张合成切片的描述.
#[derive(Clone, Debug)]
pub struct Synth {
    pub series_uid: Option<String>,
    pub sop_uid: Option<String>,
    pub instance_number: Option<i32>,
    /// 左上角是否比其余像素亮. 配合 [`bright_corner_classifier`] 决定类别.
    pub bright_corner: bool,
    /// `(Window Center, Window Width)`.
    pub window: Option<(f64, f64)>,
    /// `(Rescale Slope, Rescale Intercept)`.
    pub rescale: Option<(f64, f64)>,
}

impl Synth {
    pub fn new(series_uid: &str, sop_uid: &str, instance_number: i32, bright_corner: bool) -> Self {
        Self {
            series_uid: Some(series_uid.to_string()),
            sop_uid: Some(sop_uid.to_string()),
            instance_number: Some(instance_number),
            bright_corner,
            window: None,
            rescale: None,
        }
    }

    fn pixels(&self) -> Vec<u16> {
        let side = SIDE as usize;
        (0..side * side)
            .map(|i| {
                let (r, c) = (i / side, i % side);
                if self.bright_corner && r < side / 4 && c < side / 4 {
                    4000
                } else {
                    100 + ((r * 7 + c * 3) % 11) as u16
                }
            })
            .collect()
    }

    pub fn build(&self) -> DefaultDicomObject {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::MR_IMAGE_STORAGE),
        ));
        if let Some(uid) = &self.sop_uid {
            obj.put(DataElement::new(
                tags::SOP_INSTANCE_UID,
                VR::UI,
                PrimitiveValue::from(uid.as_str()),
            ));
        }
        if let Some(uid) = &self.series_uid {
            obj.put(DataElement::new(
                tags::SERIES_INSTANCE_UID,
                VR::UI,
                PrimitiveValue::from(uid.as_str()),
            ));
        }
        if let Some(n) = self.instance_number {
            obj.put(DataElement::new(
                tags::INSTANCE_NUMBER,
                VR::IS,
                PrimitiveValue::from(n.to_string()),
            ));
        }
        let mut put_ds = |tag, v: f64| {
            obj.put(DataElement::new(tag, VR::DS, PrimitiveValue::from(v.to_string())));
        };
        if let Some((center, width)) = self.window {
            put_ds(tags::WINDOW_CENTER, center);
            put_ds(tags::WINDOW_WIDTH, width);
        }
        if let Some((slope, intercept)) = self.rescale {
            put_ds(tags::RESCALE_SLOPE, slope);
            put_ds(tags::RESCALE_INTERCEPT, intercept);
        }
        for (tag, v) in [
            (tags::SAMPLES_PER_PIXEL, 1u16),
            (tags::ROWS, SIDE),
            (tags::COLUMNS, SIDE),
            (tags::BITS_ALLOCATED, 16),
            (tags::BITS_STORED, 16),
            (tags::HIGH_BIT, 15),
            (tags::PIXEL_REPRESENTATION, 0),
        ] {
            obj.put(DataElement::new(tag, VR::US, PrimitiveValue::from(v)));
        }
        obj.put(DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ));
        obj.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U16(self.pixels().into_iter().collect()),
        ));

        let sop = self.sop_uid.clone().unwrap_or_else(|| "1.2.999".to_string());
        obj.with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::MR_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(sop),
        )
        .unwrap()
    }

    /// 写入 `path`, 返回 `path`.
    pub fn write_to(&self, path: &Path) -> PathBuf {
        self.build().write_to_file(path).unwrap();
        path.to_owned()
    }

    /// 以完整文件 (含前导区与魔数) 的形式得到字节流.
    pub fn to_bytes(&self) -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = self.write_to(&dir.path().join("tmp.dcm"));
        fs::read(path).unwrap()
    }
}

/// 打开测试日志. 多个测试重复调用时只有第一次生效.
pub fn init_log() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}

/// 魔数正确但内容损坏的字节流.
pub fn corrupt_bytes() -> Vec<u8> {
    let mut bytes = vec![0u8; 128];
    bytes.extend_from_slice(b"DICM");
    bytes.extend_from_slice(&[0xfe; 64]);
    bytes
}

/// 以左上角像素判定类别的桩分类器: 规范化后左上角高于均值即为脑部.
pub fn bright_corner_classifier() -> impl Classifier {
    FnClassifier(|t: &Tensor| {
        assert_eq!(t.dim(), (1, 256, 256));
        let label = if t[[0, 0, 0]] > 0.0 {
            ClassLabel::Brain
        } else {
            ClassLabel::NonBrain
        };
        Ok::<_, InferenceError>(label)
    })
}

/// 在 `root` 下创建序列目录 `name`, 写入若干切片, 返回目录路径.
pub fn make_series(root: &Path, name: &str, slices: &[(&str, Synth)]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for (file, synth) in slices {
        synth.write_to(&dir.join(file));
    }
    dir
}
