use std::ops::Range;

use ndarray::{s, Array3, ArrayView3};
use num::Integer;

use crate::Shape2d;

/// area 插值中, 输出第 `i` 个位置对应的输入区间.
///
/// 输入长度 `n`, 输出长度 `m` 时, 区间为 `[floor(i·n/m), ceil((i+1)·n/m))`.
/// 缩小与放大都适用; 放大时区间长度为 1 或 2.
///
/// 如果 `m == 0`, 则程序 panic.
#[inline]
pub fn area_window(i: usize, n: usize, m: usize) -> Range<usize> {
    let start = (i * n) / m;
    let end = Integer::div_ceil(&((i + 1) * n), &m);
    start..end
}

/// 以 area 插值 (自适应平均池化) 把每个通道缩放到 `(out_h, out_w)`.
///
/// 每个输出像素是其对应输入矩形窗口内像素的算术平均. 累加顺序固定 (行优先),
/// 因此结果是确定的.
///
/// 如果输入的空间维为空, 或 `out_h`, `out_w` 为 0, 则程序 panic.
pub fn resize_area(input: ArrayView3<f32>, (out_h, out_w): Shape2d) -> Array3<f32> {
    let (channels, in_h, in_w) = input.dim();
    assert!(in_h > 0 && in_w > 0, "输入空间维不能为空");
    assert!(out_h > 0 && out_w > 0, "输出空间维不能为空");

    let rows: Vec<Range<usize>> = (0..out_h).map(|i| area_window(i, in_h, out_h)).collect();
    let cols: Vec<Range<usize>> = (0..out_w).map(|j| area_window(j, in_w, out_w)).collect();

    Array3::from_shape_fn((channels, out_h, out_w), |(c, i, j)| {
        let window = input.slice(s![c, rows[i].clone(), cols[j].clone()]);
        let sum: f64 = window.iter().map(|&v| v as f64).sum();
        (sum / window.len() as f64) as f32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_area_window() {
        // 缩小 4 -> 2.
        assert_eq!(area_window(0, 4, 2), 0..2);
        assert_eq!(area_window(1, 4, 2), 2..4);

        // 非整除 5 -> 3: [0, 2), [1, 4), [3, 5).
        assert_eq!(area_window(0, 5, 3), 0..2);
        assert_eq!(area_window(1, 5, 3), 1..4);
        assert_eq!(area_window(2, 5, 3), 3..5);

        // 放大 2 -> 4.
        assert_eq!(area_window(0, 2, 4), 0..1);
        assert_eq!(area_window(1, 2, 4), 0..1);
        assert_eq!(area_window(2, 2, 4), 1..2);
        assert_eq!(area_window(3, 2, 4), 1..2);
    }

    #[test]
    fn test_downsample_average() {
        let input = array![[
            [1.0f32, 3.0, 10.0, 10.0],
            [1.0, 3.0, 20.0, 20.0],
            [0.0, 0.0, 4.0, 8.0],
            [0.0, 0.0, 4.0, 8.0]
        ]];
        let out = resize_area(input.view(), (2, 2));
        assert_eq!(out, array![[[2.0f32, 15.0], [0.0, 6.0]]]);
    }

    #[test]
    fn test_upsample_replicates() {
        let input = array![[[1.0f32, 2.0], [3.0, 4.0]]];
        let out = resize_area(input.view(), (4, 4));
        assert_eq!(
            out,
            array![[
                [1.0f32, 1.0, 2.0, 2.0],
                [1.0, 1.0, 2.0, 2.0],
                [3.0, 3.0, 4.0, 4.0],
                [3.0, 3.0, 4.0, 4.0]
            ]]
        );
    }

    #[test]
    fn test_identity_on_same_size() {
        let input = Array3::from_shape_fn((1, 7, 5), |(_, h, w)| (h * 5 + w) as f32 * 0.1);
        assert_eq!(resize_area(input.view(), (7, 5)), input);
    }
}
