use crate::{classifier::labels::LesionLabel, error::InferenceError};
use serde::Serialize;

/// Allowed deviation of the probability sum from 1.0.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: LesionLabel,
    pub probability: f32,
}

/// A probability distribution over lesion labels, in the classifier's
/// native label order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    predictions: Vec<Prediction>,
}

impl ClassificationResult {
    /// Builds a result, checking that probabilities lie in [0, 1], sum to
    /// one and that no label repeats.
    pub fn new(predictions: Vec<Prediction>) -> Result<Self, InferenceError> {
        if predictions.is_empty() {
            return Err(InferenceError::InvalidDistribution(
                "no predictions".to_string(),
            ));
        }

        for (position, prediction) in predictions.iter().enumerate() {
            if !prediction.probability.is_finite()
                || !(0.0..=1.0).contains(&prediction.probability)
            {
                return Err(InferenceError::InvalidDistribution(format!(
                    "probability {} for '{}' is outside [0, 1]",
                    prediction.probability, prediction.label
                )));
            }
            if predictions[..position]
                .iter()
                .any(|earlier| earlier.label == prediction.label)
            {
                return Err(InferenceError::InvalidDistribution(format!(
                    "label '{}' appears more than once",
                    prediction.label
                )));
            }
        }

        let result = Self { predictions };
        let sum = result.probability_sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(InferenceError::InvalidDistribution(format!(
                "probabilities sum to {}",
                sum
            )));
        }

        Ok(result)
    }

    /// Pairs `probabilities[i]` with `LesionLabel::ALL[i]`.
    pub fn from_native_order(probabilities: &[f32]) -> Result<Self, InferenceError> {
        if probabilities.len() != LesionLabel::ALL.len() {
            return Err(InferenceError::OutputShape {
                expected: LesionLabel::ALL.len(),
                shape: vec![probabilities.len()],
            });
        }

        Self::new(
            LesionLabel::ALL
                .iter()
                .zip(probabilities)
                .map(|(label, probability)| Prediction {
                    label: *label,
                    probability: *probability,
                })
                .collect(),
        )
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    #[cfg(test)]
    pub fn probability_of(&self, label: LesionLabel) -> Option<f32> {
        self.predictions
            .iter()
            .find(|p| p.label == label)
            .map(|p| p.probability)
    }

    /// True when every label of the fixed label set is present exactly once.
    #[cfg(test)]
    pub fn covers_label_set(&self) -> bool {
        self.predictions.len() == LesionLabel::ALL.len()
            && LesionLabel::ALL
                .iter()
                .all(|label| self.probability_of(*label).is_some())
    }

    pub fn probability_sum(&self) -> f64 {
        self.predictions.iter().map(|p| p.probability as f64).sum()
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
