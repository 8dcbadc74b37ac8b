use ndarray::{ArrayBase, DataMut, Dimension};

/// 数组的一阶、二阶矩.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Moments {
    /// 均值.
    pub mean: f64,

    /// 总体标准差 (除以 `n`, 而不是 `n - 1`).
    pub std: f64,
}

impl Moments {
    /// 按行优先顺序在 `f64` 上累加, 顺序固定以保证结果确定.
    ///
    /// 空数组返回 `None`.
    pub fn of<'a, I: IntoIterator<Item = &'a f32>>(values: I) -> Option<Moments> {
        let values: Vec<f64> = values.into_iter().map(|&v| v as f64).collect();
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Some(Moments {
            mean,
            std: var.sqrt(),
        })
    }

    /// 规范化时实际使用的除数. 标准差为 0 时取 1, 即只做平移.
    #[inline]
    pub fn divisor(&self) -> f64 {
        if self.std == 0.0 {
            1.0
        } else {
            self.std
        }
    }
}

/// 就地把 `data` 规范化为零均值、单位方差.
///
/// 统计量由 `data` 自身计算, 不使用任何全局统计量. 返回所用的统计量;
/// `data` 为空时不做任何事, 返回 `None`.
pub fn normalize_intensity<S, D>(data: &mut ArrayBase<S, D>) -> Option<Moments>
where
    S: DataMut<Elem = f32>,
    D: Dimension,
{
    let moments = Moments::of(data.iter())?;
    let (mean, div) = (moments.mean, moments.divisor());
    data.mapv_inplace(|v| ((v as f64 - mean) / div) as f32);
    Some(moments)
}
