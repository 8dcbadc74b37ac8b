//! 推理前的固定预处理流程.
//!
//! 依次执行:
//!
//! 1. [`add_channel`]: `(H, W)` → `(1, H, W)`;
//! 2. [`normalize_intensity`]: 以数组自身的均值/标准差规范化到零均值、单位方差;
//! 3. [`resize_area`]: area 插值缩放到 `256 × 256`.
//!
//! 整个流程是纯函数, 相同输入得到逐字节相同的输出. 推理时不做任何随机增强.

use ndarray::{Array2, Array3, Axis};

use crate::consts::MODEL_INPUT_SIDE;

mod normalize;
mod resize;

pub use normalize::{normalize_intensity, Moments};
pub use resize::{area_window, resize_area};

/// 模型输入张量, 形状为 `(通道, 高, 宽)`.
pub type Tensor = Array3<f32>;

/// 为二维数组加上单一的前导通道维.
#[inline]
pub fn add_channel(pixels: Array2<f32>) -> Array3<f32> {
    pixels.insert_axis(Axis(0))
}

/// 把原始像素数组变换为模型需要的 `1 × 256 × 256` 张量.
///
/// 如果 `pixels` 为空数组, 则程序 panic.
pub fn preprocess(pixels: Array2<f32>) -> Tensor {
    assert!(!pixels.is_empty(), "影像不能为空");
    let mut tensor = add_channel(pixels);
    normalize_intensity(&mut tensor);
    resize_area(tensor.view(), (MODEL_INPUT_SIDE, MODEL_INPUT_SIDE))
}
