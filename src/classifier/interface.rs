use crate::{
    classifier::result::ClassificationResult, error::InferenceError, intake::DecodedImage,
};

/// Where a classifier's scores come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    /// A trained model.
    Model,
    /// A model-free stand-in. Its scores must never be shown as a prediction
    /// without saying so.
    Demo,
}

/// An opaque image classifier over the fixed lesion label set.
///
/// Implementations are loaded once per process and shared between sessions,
/// so `classify` takes `&self` and must not keep per-image state.
pub trait LesionClassifier: Send + Sync {
    fn classify(&self, image: &DecodedImage) -> Result<ClassificationResult, InferenceError>;

    fn name(&self) -> &'static str;

    fn source(&self) -> PredictionSource {
        PredictionSource::Model
    }
}
