pub mod impl_reference;
pub mod impl_tract_onnx;
pub mod interface;
pub mod labels;
pub mod preprocess;
pub mod result;
pub mod service;

pub use impl_reference::ReferenceClassifier;
pub use impl_tract_onnx::TractOnnxClassifier;
pub use interface::{LesionClassifier, PredictionSource};
pub use labels::{LabelMetadata, LesionLabel, LABEL_METADATA};
pub use result::{ClassificationResult, Prediction};
pub use service::{ClassificationService, ClassifierHandle};

use crate::{
    config::{ClassifierBackend, ModelConfig},
    error::AppError,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Loads the configured classifier. Called once at startup; a failure here
/// is fatal.
pub fn load(config: &ModelConfig) -> Result<Arc<dyn LesionClassifier>, AppError> {
    let classifier: Arc<dyn LesionClassifier> = match config.backend {
        ClassifierBackend::Onnx => Arc::new(TractOnnxClassifier::load(config)?),
        ClassifierBackend::Reference => Arc::new(ReferenceClassifier::new()),
    };
    match classifier.source() {
        PredictionSource::Model => info!("Using '{}' classifier", classifier.name()),
        PredictionSource::Demo => warn!(
            "Using the '{}' demo classifier, its scores are not model predictions",
            classifier.name()
        ),
    }
    Ok(classifier)
}
