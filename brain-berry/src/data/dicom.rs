//! 单个 DICOM 文件的读取.
//!
//! 既支持磁盘路径, 也支持内存中的字节流 (HTTP 上传).

use crate::consts::dicm::{MAGIC, PREAMBLE_LEN};
use crate::error::LoadError;
use crate::InstanceNumber;
use dicom_dictionary_std::tags;
use dicom_object::file::ReadPreamble;
use dicom_object::{DefaultDicomObject, OpenFileOptions};
use dicom_pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption};
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// `DICM` 魔数的位置.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum MagicAt {
    /// 标准格式: 128 字节前导区之后.
    AfterPreamble,

    /// 无前导区, 文件以魔数开头.
    Start,
}

impl MagicAt {
    /// 从文件开头的若干字节判断魔数位置. 找不到时返回 `None`.
    fn sniff(head: &[u8]) -> Option<Self> {
        if head.get(PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()) == Some(MAGIC.as_slice()) {
            Some(Self::AfterPreamble)
        } else if head.starts_with(MAGIC) {
            Some(Self::Start)
        } else {
            None
        }
    }

    #[inline]
    fn offset(self) -> usize {
        match self {
            Self::AfterPreamble => PREAMBLE_LEN,
            Self::Start => 0,
        }
    }

    #[inline]
    fn read_preamble(self) -> ReadPreamble {
        match self {
            Self::AfterPreamble => ReadPreamble::Always,
            Self::Start => ReadPreamble::Never,
        }
    }
}

/// 读取文件开头, 判断魔数位置.
fn sniff_file(path: &Path) -> Result<MagicAt, LoadError> {
    let mut head = Vec::with_capacity(PREAMBLE_LEN + MAGIC.len());
    File::open(path)?
        .take((PREAMBLE_LEN + MAGIC.len()) as u64)
        .read_to_end(&mut head)?;
    MagicAt::sniff(&head).ok_or(LoadError::NotDicom)
}

/// 已打开的 DICOM 文件.
///
/// 该结构是只读的. 属性访问均返回 `Result`, 缺失时给出
/// [`LoadError::MissingMetadata`].
#[derive(Debug, Clone)]
pub struct DicomSlice {
    obj: DefaultDicomObject,
}

impl DicomSlice {
    /// 打开路径 `path` 处的完整 DICOM 文件 (含像素).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let magic = sniff_file(path)?;
        let obj = OpenFileOptions::new()
            .read_preamble(magic.read_preamble())
            .open_file(path)
            .map_err(|e| LoadError::Corrupt(e.to_string()))?;
        Ok(Self { obj })
    }

    /// 只读取 `path` 处 DICOM 文件的头部, 在像素数据之前停止.
    ///
    /// 适用于只关心元数据 (如 InstanceNumber) 的场景. 对返回值调用
    /// [`Self::pixel_array`] 会失败.
    pub fn open_header<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let magic = sniff_file(path)?;
        let obj = OpenFileOptions::new()
            .read_preamble(magic.read_preamble())
            .read_until(tags::PIXEL_DATA)
            .open_file(path)
            .map_err(|e| LoadError::Corrupt(e.to_string()))?;
        Ok(Self { obj })
    }

    /// 从内存字节流解码完整的 DICOM 文件.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let magic = MagicAt::sniff(bytes).ok_or(LoadError::NotDicom)?;
        let obj = dicom_object::from_reader(&bytes[magic.offset()..])
            .map_err(|e| LoadError::Corrupt(e.to_string()))?;
        Ok(Self { obj })
    }

    /// 获取字符串属性, 去除尾部填充. 空值视为缺失.
    fn string_attr(
        &self,
        tag: dicom_core::Tag,
        name: &'static str,
    ) -> Result<String, LoadError> {
        let missing = || LoadError::MissingMetadata { tag: name };
        let value = self
            .obj
            .element(tag)
            .map_err(|_| missing())?
            .to_str()
            .map_err(|_| missing())?;
        let value = value.trim_end_matches(['\0', ' ']).trim_start();
        if value.is_empty() {
            Err(missing())
        } else {
            Ok(value.to_string())
        }
    }

    /// Series Instance UID, 标识所属序列.
    #[inline]
    pub fn series_instance_uid(&self) -> Result<String, LoadError> {
        self.string_attr(tags::SERIES_INSTANCE_UID, "SeriesInstanceUID")
    }

    /// SOP Instance UID, 标识单张影像.
    #[inline]
    pub fn sop_instance_uid(&self) -> Result<String, LoadError> {
        self.string_attr(tags::SOP_INSTANCE_UID, "SOPInstanceUID")
    }

    /// Instance Number, 序列内的排序键.
    pub fn instance_number(&self) -> Result<InstanceNumber, LoadError> {
        let missing = || LoadError::MissingMetadata {
            tag: "InstanceNumber",
        };
        self.obj
            .element(tags::INSTANCE_NUMBER)
            .map_err(|_| missing())?
            .to_int::<InstanceNumber>()
            .map_err(|_| missing())
    }

    /// 文件自带的显示窗口 `(窗位, 窗宽)`. 任一缺失时返回 `None`.
    pub fn window(&self) -> Option<(f64, f64)> {
        let center = self.obj.element(tags::WINDOW_CENTER).ok()?.to_float64().ok()?;
        let width = self.obj.element(tags::WINDOW_WIDTH).ok()?.to_float64().ok()?;
        Some((center, width))
    }

    /// Rescale Slope / Rescale Intercept, 即存储值到模态值的线性变换 `(slope, intercept)`.
    ///
    /// 缺失或无法解析时取恒等变换 `(1, 0)`.
    pub fn rescale(&self) -> (f64, f64) {
        let attr = |tag| {
            self.obj
                .element(tag)
                .ok()
                .and_then(|e| e.to_float64().ok())
                .filter(|v| v.is_finite())
        };
        (
            attr(tags::RESCALE_SLOPE).filter(|&s| s != 0.0).unwrap_or(1.0),
            attr(tags::RESCALE_INTERCEPT).unwrap_or(0.0),
        )
    }

    /// 解码第 0 帧的像素, 返回 `(rows, columns)` 形状的二维数组.
    ///
    /// 数值为存储值本身 (不应用 modality / VOI 变换). 多采样 (彩色) 图像返回
    /// [`LoadError::UnsupportedLayout`].
    pub fn pixel_array(&self) -> Result<Array2<f32>, LoadError> {
        let decoded = self
            .obj
            .decode_pixel_data()
            .map_err(|e| LoadError::Corrupt(e.to_string()))?;

        let samples = decoded.samples_per_pixel();
        if samples != 1 {
            return Err(LoadError::UnsupportedLayout(format!(
                "{samples} samples per pixel"
            )));
        }
        let (frames, rows, cols) = (
            decoded.number_of_frames(),
            decoded.rows() as usize,
            decoded.columns() as usize,
        );
        if frames == 0 || rows == 0 || cols == 0 {
            return Err(LoadError::Corrupt(format!(
                "empty pixel data ({frames} × {rows} × {cols})"
            )));
        }

        let options = ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::None)
            .with_voi_lut(VoiLutOption::Identity);
        let flat = decoded
            .to_vec_frame_with_options::<f32>(0, &options)
            .map_err(|e| LoadError::Corrupt(e.to_string()))?;
        let found = flat.len();
        Array2::from_shape_vec((rows, cols), flat).map_err(|_| {
            LoadError::Corrupt(format!(
                "frame has {found} samples, expected {rows} × {cols}"
            ))
        })
    }
}
