//! 🧠欢迎光临🫐
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{InstanceNumber, Shape2d};

pub use crate::{save_preview, DicomSlice, DisplayWindow, ImageRecord, ImgWriteVis};

pub use crate::batch::{
    classify_images, classify_series, FailurePolicy, Outcome, PredictionRecord, SeriesPrediction,
};
pub use crate::error::{FatalError, ItemError, LoadError, PipelineError, StartupError};
pub use crate::infer::{ClassLabel, Classifier, ClassifierConfig, Device, OnnxClassifier};
pub use crate::series::{parse_manifest, select_central_slice, SeriesInput};
pub use crate::sink::{CsvSink, ImagePrediction, SeriesRow, SeriesSummary};
pub use crate::transform::{preprocess, Tensor};

pub use crate::consts::{DEFAULT_MODEL_PATH, MODEL_INPUT_SIDE, MODEL_PATH_ENV, UPLOAD_FIELD};
