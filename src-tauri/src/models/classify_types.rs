use serde::{Deserialize, Serialize};

const HIGH_CONFIDENCE: f64 = 0.86;
const MEDIUM_CONFIDENCE: f64 = 0.51;

/// A single `(class, probability)` pair as returned by the service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClassProbability {
    #[serde(rename = "class")]
    pub class_name: String,
    pub probability: f64,
}

/// Parsed response body of the classification endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClassificationResult {
    pub predicted_class: ClassProbability,
    pub probabilities: Vec<ClassProbability>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_CONFIDENCE {
            ConfidenceBand::High
        } else if probability >= MEDIUM_CONFIDENCE {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "High confidence",
            ConfidenceBand::Medium => "Medium confidence",
            ConfidenceBand::Low => "Low confidence",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "✅",
            ConfidenceBand::Medium => "⚠️",
            ConfidenceBand::Low => "❌",
        }
    }
}

/// Display-ready rendering of a [`ClassificationResult`].
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ResultView {
    pub label: String,
    pub band: ConfidenceBand,
    pub band_text: String,
    pub icon: String,
    pub percentage: String,
    pub details: Vec<String>,
}

impl From<&ClassificationResult> for ResultView {
    fn from(result: &ClassificationResult) -> Self {
        let predicted = &result.predicted_class;
        let band = ConfidenceBand::from_probability(predicted.probability);

        // Whole percent, truncated
        let percent = (predicted.probability * 100.0) as i64;

        let details = result
            .probabilities
            .iter()
            .map(|p| format!("{}: {:.2}%", p.class_name, p.probability * 100.0))
            .collect();

        ResultView {
            label: predicted.class_name.clone(),
            band,
            band_text: band.text().to_string(),
            icon: band.icon().to_string(),
            percentage: format!("{}%", percent),
            details,
        }
    }
}
