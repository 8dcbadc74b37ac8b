//! 切片预览的持久化存储.

use super::window::DisplayWindow;
use image::ImageResult;
use ndarray::ArrayView2;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 图像会经过显示窗口映射为 8-bit 灰度后保存, 而不是按原样保存.
pub trait ImgWriteVis {
    /// 按照窗口 `window` 将图片保存到 `path` 路径. 格式由扩展名决定.
    fn save<P: AsRef<Path>>(&self, window: &DisplayWindow, path: P) -> ImageResult<()>;
}

impl ImgWriteVis for ArrayView2<'_, f32> {
    fn save<P: AsRef<Path>>(&self, window: &DisplayWindow, path: P) -> ImageResult<()> {
        let (height, width) = self.dim();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &v) in self.indexed_iter() {
            // 非有限值画成黑色.
            let gray = window.eval(v).unwrap_or(u8::MIN);
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

/// 按 `window` 把二维切片 `pixels` 保存为灰度图.
#[inline]
pub fn save_preview<P: AsRef<Path>>(
    pixels: ArrayView2<f32>,
    window: &DisplayWindow,
    path: P,
) -> ImageResult<()> {
    pixels.save(window, path)
}
