#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 对 DICOM 单张影像或整个序列做 "脑部 / 非脑部" 二分类.
//!
//! 该 crate 提供两种访问模式共用的推理链路:
//!
//! 1. 单图模式 (HTTP 服务): 逐个解码上传的 DICOM 字节流, 每个文件产生一条记录;
//! 2. 序列模式 (批处理命令行): 对每个序列目录选取一张代表性切片 (InstanceNumber
//!   的下中位数), 仅输出成功的序列.
//!
//! # 注意
//!
//! 1. 单个坏文件、坏序列不能中断整个批次. 可恢复错误在 [`batch`] 边界被隔离,
//!   不会继续向外传播.
//! 2. 预处理与模型输入形状不一致属于程序契约错误, 会终止整个批次
//!   (见 [`error::FatalError`]).
//!
//! # 开发计划
//!
//! ### DICOM 读取 ✅
//!
//! 区分 "不是 DICOM 容器" 与 "容器损坏", 支持只读头部 (不读像素).
//!
//! 实现位于 `brain-berry/src/data/dicom.rs`.
//!
//! ### 中心切片选取 ✅
//!
//! 以 InstanceNumber 的下中位数为准. 偶数个时取较小的那个中间值, 而不是平均值.
//!
//! 实现位于 `brain-berry/src/series/select.rs`.
//!
//! ### 预处理 ✅
//!
//! 加通道维 → 自身均值/标准差规范化 → area 插值缩放到 256 × 256.
//! 结果逐字节确定.
//!
//! 实现位于 `brain-berry/src/transform`.
//!
//! ### ONNX 推理 ✅
//!
//! 模型启动时加载一次, 之后只读共享.
//!
//! 实现位于 `brain-berry/src/infer`.
//!
//! ### 批处理与结果输出 ✅
//!
//! 实现位于 `brain-berry/src/batch` 与 `brain-berry/src/sink`.
//!
//! ### 切片预览 ✅
//!
//! 按显示窗口把被选中的切片保存为 8-bit 灰度图, 便于人工核对.
//!
//! 实现位于 `brain-berry/src/data/window.rs` 与 `brain-berry/src/data/save.rs`.

/// 二维形状 `(高, 宽)`, 与 ndarray 的行优先约定一致.
pub type Shape2d = (usize, usize);

/// 切片在序列内的排序键.
pub type InstanceNumber = i32;

mod data;

pub use data::{
    dicom::{self, DicomSlice},
    save::{save_preview, ImgWriteVis},
    window::DisplayWindow,
    ImageRecord,
};

pub mod batch;
pub mod consts;
pub mod error;
pub mod infer;
pub mod prelude;
pub mod series;
pub mod sink;
pub mod transform;
