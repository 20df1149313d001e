use crate::classifier::{ClassificationResult, LesionLabel};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedPrediction {
    pub label: LesionLabel,
    pub probability: f32,
    /// Position in the classifier's native label order.
    pub native_index: usize,
}

impl RankedPrediction {
    pub fn percentage(&self) -> String {
        format_percentage(self.probability)
    }
}

/// The classifier output arranged for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    top: RankedPrediction,
    ranking: Vec<RankedPrediction>,
}

impl Presentation {
    pub fn new(result: &ClassificationResult) -> Self {
        Self {
            top: top_prediction(result),
            ranking: rank_descending(result),
        }
    }

    pub fn top(&self) -> &RankedPrediction {
        &self.top
    }

    /// Highest probability first.
    pub fn ranking(&self) -> &[RankedPrediction] {
        &self.ranking
    }

    /// Lowest probability first: the chart draws its first row at the bottom.
    pub fn chart_order(&self) -> impl Iterator<Item = &RankedPrediction> {
        self.ranking.iter().rev()
    }
}

fn ranked(result: &ClassificationResult) -> impl Iterator<Item = RankedPrediction> + '_ {
    result
        .predictions()
        .iter()
        .enumerate()
        .map(|(native_index, p)| RankedPrediction {
            label: p.label,
            probability: p.probability,
            native_index,
        })
}

/// Maximum probability; on ties the earliest label in native order wins.
pub fn top_prediction(result: &ClassificationResult) -> RankedPrediction {
    let mut predictions = ranked(result);
    // ClassificationResult is never empty
    let first = predictions.next().unwrap_or(RankedPrediction {
        label: LesionLabel::ALL[0],
        probability: 0.0,
        native_index: 0,
    });
    predictions.fold(first, |best, candidate| {
        if candidate.probability > best.probability {
            candidate
        } else {
            best
        }
    })
}

/// All predictions by descending probability, ties kept in native order.
pub fn rank_descending(result: &ClassificationResult) -> Vec<RankedPrediction> {
    let mut ranking: Vec<RankedPrediction> = ranked(result).collect();
    // sort_by is stable
    ranking.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    ranking
}

pub fn format_percentage(probability: f32) -> String {
    format!("{:.2}%", probability * 100.0)
}
