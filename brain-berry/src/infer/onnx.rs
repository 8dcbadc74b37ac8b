//! 基于 ONNX Runtime 的分类器.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::info;
use ndarray::Axis;
use ort::logging::LogLevel;
use ort::session::builder::SessionBuilder;
use ort::session::Session;
use ort::value::TensorRef;

use super::{argmax, ClassLabel, Classifier, ClassifierConfig, Device};
use crate::consts::NUM_CLASSES;
use crate::error::{InferenceError, StartupError};
use crate::transform::Tensor;

/// ONNX Runtime 分类器.
///
/// 模型在构造时加载一次, 之后不再修改或重新加载. ORT 的前向计算需要独占会话,
/// 因此会话放在 `Mutex` 中, 并发调用会被串行化.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    expected_input: [usize; 3],
    model_path: PathBuf,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("expected_input", &self.expected_input)
            .field("model_path", &self.model_path)
            .finish()
    }
}

/// 把 ORT 错误包装为启动错误.
fn load_error<E: Into<ort::Error>>(path: &Path, e: E) -> StartupError {
    StartupError::Ort {
        path: path.to_owned(),
        source: e.into(),
    }
}

/// 根据设备注册执行后端.
fn apply_device(
    builder: SessionBuilder,
    device: Device,
    path: &Path,
) -> Result<SessionBuilder, StartupError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "cuda")] {
            use ort::execution_providers::CUDAExecutionProvider;

            match device {
                Device::Cpu => Ok(builder),
                // 注册失败时 ORT 自动退回 CPU.
                Device::Auto => builder
                    .with_execution_providers([CUDAExecutionProvider::default().build()])
                    .map_err(|e| load_error(path, e)),
                Device::Cuda(id) => builder
                    .with_execution_providers([CUDAExecutionProvider::default()
                        .with_device_id(id)
                        .build()
                        .error_on_failure()])
                    .map_err(|e| load_error(path, e)),
            }
        } else {
            let _ = path;
            match device {
                Device::Cpu | Device::Auto => Ok(builder),
                Device::Cuda(_) => Err(StartupError::DeviceUnavailable(format!(
                    "{device} requested but built without the `cuda` feature"
                ))),
            }
        }
    }
}

impl OnnxClassifier {
    /// 按 `config` 加载模型.
    ///
    /// 模型文件不存在或无法加载时返回 [`StartupError`], 调用方应据此终止启动.
    pub fn new(config: &ClassifierConfig) -> Result<Self, StartupError> {
        let path = config.model_path();
        if !path.is_file() {
            return Err(StartupError::ModelNotFound(path.to_owned()));
        }
        let builder = Session::builder()
            .map_err(|e| load_error(path, e))?
            .with_log_level(LogLevel::Error)
            .map_err(|e| load_error(path, e))?;
        let session = apply_device(builder, config.device(), path)?
            .commit_from_file(path)
            .map_err(|e| load_error(path, e))?;

        let signature = |what| StartupError::Signature {
            path: path.to_owned(),
            what,
        };
        let input_name = match config.input_name() {
            Some(name) => name.to_string(),
            None => session
                .inputs
                .first()
                .map(|i| i.name.clone())
                .ok_or_else(|| signature("inputs"))?,
        };
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| signature("outputs"))?;

        info!(
            "Loaded model '{}' on {} (input '{input_name}', output '{output_name}')",
            path.display(),
            config.device()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            expected_input: config.expected_input(),
            model_path: path.to_owned(),
        })
    }

    /// 模型路径.
    #[inline]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, input: &Tensor) -> Result<ClassLabel, InferenceError> {
        if input.shape() != self.expected_input.as_slice() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.expected_input.to_vec(),
                found: input.shape().to_vec(),
            });
        }

        // (C, H, W) -> (1, C, H, W)
        let batch = input.view().insert_axis(Axis(0));
        let tensor = TensorRef::from_array_view(batch)?;

        // 会话内没有需要恢复的不变量, 锁中毒时继续使用.
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let outputs = session.run(ort::inputs![self.input_name.as_str() => tensor])?;
        let (shape, logits) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        if logits.len() != NUM_CLASSES {
            return Err(InferenceError::UnexpectedOutput {
                shape: shape.to_vec(),
            });
        }
        let index = argmax(logits).and_then(ClassLabel::from_index);
        index.ok_or_else(|| InferenceError::UnexpectedOutput {
            shape: shape.to_vec(),
        })
    }
}
