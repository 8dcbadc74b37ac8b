//! 通用常量.

/// 模型输入的空间边长. 预处理输出固定为 `1 × 256 × 256`.
pub const MODEL_INPUT_SIDE: usize = 256;

/// 模型输入的通道数.
pub const MODEL_INPUT_CHANNELS: usize = 1;

/// 分类器输出的类别个数.
pub const NUM_CLASSES: usize = 2;

/// 模型权重默认位置 (相对于当前工作目录).
pub const DEFAULT_MODEL_PATH: &str = "model_weight/best_metric_model.onnx";

/// 指定模型权重位置的环境变量.
pub const MODEL_PATH_ENV: &str = "BRAIN_BERRY_MODEL";

/// HTTP 服务中上传文件共用的表单字段名.
pub const UPLOAD_FIELD: &str = "file";

/// DICOM 文件相关的魔数与偏移.
pub mod dicm {
    /// DICOM Part 10 魔数.
    pub const MAGIC: &[u8; 4] = b"DICM";

    /// 标准前导区长度. 魔数紧跟其后.
    pub const PREAMBLE_LEN: usize = 128;
}

/// 序列模式 CSV 输出的列名, 顺序即输出顺序.
pub const CSV_COLUMNS: [&str; 3] = ["series_instance_uid", "dir_path", "prediction"];
