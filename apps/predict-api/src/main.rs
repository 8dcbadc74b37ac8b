//! 单图分类 HTTP 服务.
//!
//! ```text
//! curl -F file=@a.dcm -F file=@b.dcm http://127.0.0.1:5000/predict
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use brain_berry::infer::{ClassifierConfig, Device, OnnxClassifier};
use clap::Parser;
use log::info;

mod handlers;

use handlers::AppState;

/// 脑部 / 非脑部 DICOM 分类服务.
#[derive(Debug, Parser)]
#[command(name = "predict-api", version)]
struct ServerConfig {
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// 监听端口
    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// worker 线程数 [默认: CPU 核数]
    #[arg(long)]
    workers: Option<usize>,

    /// 模型权重路径 [默认: $BRAIN_BERRY_MODEL 或 ./model_weight/best_metric_model.onnx]
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// 计算设备: cpu, auto, cuda 或 cuda:N
    #[arg(long, default_value_t = Device::Auto)]
    device: Device,

    /// 关闭日志输出
    #[arg(short, long)]
    quiet: bool,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    utils::init_logging(config.quiet)?;

    // 模型必须在开始监听之前加载完成.
    let classifier = OnnxClassifier::new(
        &ClassifierConfig::new(utils::resolve_model_path(config.model.clone()))
            .with_device(config.device),
    )?;
    let state = web::Data::new(AppState::new(Arc::new(classifier)));

    info!("Listening on {}:{}", config.host, config.port);
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }
    server
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;

    info!("Server stopped.");
    Ok(())
}
