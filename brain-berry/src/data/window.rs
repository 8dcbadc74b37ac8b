use ndarray::ArrayView2;

use super::dicom::DicomSlice;

/// 显示窗口, 包含窗位 (window level) 和窗宽 (window width).
///
/// 只用于把切片像素映射为 8-bit 灰度以便预览, 不参与推理.
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct DisplayWindow {
    level: f32,
    width: f32,
}

impl DisplayWindow {
    /// 构建显示窗.
    ///
    /// `level` 必须有限, `width` 必须为正的有限值, 否则返回 `None`.
    pub fn new(level: f32, width: f32) -> Option<DisplayWindow> {
        if level.is_finite() && width.is_finite() && width > 0.0 {
            Some(Self { level, width })
        } else {
            None
        }
    }

    /// 构建恰好覆盖 `[min, max]` 的窗口.
    ///
    /// 当 `min == max` 时窗宽取 1, 以免除零. 任一值非有限或 `min > max` 时返回 `None`.
    pub fn from_range(min: f32, max: f32) -> Option<DisplayWindow> {
        if !(min.is_finite() && max.is_finite()) || min > max {
            return None;
        }
        let width = (max - min).max(1.0);
        Self::new(min + (max - min) / 2.0, width)
    }

    /// 构建覆盖 `pixels` 全部取值范围的窗口. 数组为空或含非有限值时返回 `None`.
    pub fn from_pixels(pixels: ArrayView2<f32>) -> Option<DisplayWindow> {
        let (min, max) = pixels
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &p| {
                (lo.min(p), hi.max(p))
            });
        Self::from_range(min, max)
    }

    /// 优先使用 DICOM 文件中的 Window Center / Window Width, 否则退化为
    /// [`Self::from_pixels`].
    ///
    /// 文件中的窗口定义在模态值 (Rescale 之后) 上, 而 `pixels` 是存储值, 因此先按
    /// [`DicomSlice::rescale`] 把窗口换算回存储值.
    pub fn from_dicom(slice: &DicomSlice, pixels: ArrayView2<f32>) -> Option<DisplayWindow> {
        let (slope, intercept) = slice.rescale();
        slice
            .window()
            .and_then(|(c, w)| Self::new(((c - intercept) / slope) as f32, (w / slope.abs()) as f32))
            .or_else(|| Self::from_pixels(pixels))
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 求在当前窗口设置下, 像素值 `v` 对应的灰度图像素整数值 (0 <= value <= 255)
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        self.eval_f32(v).map(|g| g as u8)
    }

    /// 求在当前窗口设置下, 像素值 `v` 对应的灰度图像素分布点 (0.0 <= value <= 255.0).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval_f32(&self, v: f32) -> Option<f32> {
        if !v.is_finite() {
            return None;
        }
        let lb = self.lower_bound();
        if v <= lb {
            Some(0.0)
        } else if v >= self.upper_bound() {
            Some(255.0)
        } else {
            // 255, not 256.
            Some((v - lb) / self.width() * 255.0)
        }
    }
}
