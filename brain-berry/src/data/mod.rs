use ndarray::Array2;

use crate::error::LoadError;
use crate::Shape2d;

pub mod dicom;
pub mod save;
pub mod window;

use dicom::DicomSlice;

/// 一张已解码的影像: 像素与最少量的标识信息.
///
/// 创建后不可变, 推理结束即丢弃.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pixel_data: Array2<f32>,
    series_id: String,
    instance_id: String,
}

impl ImageRecord {
    /// 从已打开的完整 DICOM 文件构造.
    ///
    /// SeriesInstanceUID 与 SOPInstanceUID 必须存在, 否则返回
    /// [`LoadError::MissingMetadata`]. 单图模式用不到 InstanceNumber, 不读取.
    pub fn from_slice(slice: &DicomSlice) -> Result<Self, LoadError> {
        let series_id = slice.series_instance_uid()?;
        let instance_id = slice.sop_instance_uid()?;
        let pixel_data = slice.pixel_array()?;
        Ok(Self {
            pixel_data,
            series_id,
            instance_id,
        })
    }

    /// 消费自我, 获得像素数据.
    #[inline]
    pub fn into_pixels(self) -> Array2<f32> {
        self.pixel_data
    }

    /// 影像形状 `(高, 宽)`.
    #[inline]
    pub fn shape(&self) -> Shape2d {
        self.pixel_data.dim()
    }

    /// 所属序列标识.
    #[inline]
    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    /// 影像标识.
    #[inline]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
}
