//! 两个应用共用的启动组件: 日志、模型路径.

use std::env;
use std::path::PathBuf;

use brain_berry::consts::{DEFAULT_MODEL_PATH, MODEL_PATH_ENV};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// 初始化日志.
///
/// 1. `quiet` 为真时不安装任何日志器, 并把最高级别设为 `Off`, 警告也一并屏蔽;
/// 2. 否则安装 `simple_logger`, 默认级别为 `Info`, 可由 `$RUST_LOG` 覆盖.
///
/// 重复初始化时返回错误.
pub fn init_logging(quiet: bool) -> Result<(), log::SetLoggerError> {
    if quiet {
        log::set_max_level(LevelFilter::Off);
        return Ok(());
    }
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
}

/// 获取模型权重路径.
///
/// 1. 若命令行显式给出 `flag`, 则返回它;
/// 2. 否则若环境变量 `$BRAIN_BERRY_MODEL` 非空, 则返回其值;
/// 3. 否则, 返回 `./model_weight/best_metric_model.onnx`.
///
/// 本函数不检查路径是否存在, 由模型加载时报告.
pub fn resolve_model_path(flag: Option<PathBuf>) -> PathBuf {
    resolve_model_path_with(flag, env::var(MODEL_PATH_ENV).ok())
}

fn resolve_model_path_with(flag: Option<PathBuf>, from_env: Option<String>) -> PathBuf {
    flag.or_else(|| from_env.filter(|s| !s.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
}
