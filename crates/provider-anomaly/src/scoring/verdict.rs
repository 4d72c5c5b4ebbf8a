use super::model::Classification;
use serde::{Deserialize, Serialize};

const DISPLAY_DECIMALS: i32 = 4;

/// Outcome of one scoring request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_anomalous: bool,
    pub classification: Classification,
    /// Decision score rounded to four decimal places for presentation.
    pub decision_score: f64,
    /// Unrounded model output, kept for audit trails.
    pub raw_decision_score: f64,
    pub reason: String,
}

impl Verdict {
    pub fn display_score(&self) -> String {
        format!("{:.*}", DISPLAY_DECIMALS as usize, self.decision_score)
    }

    pub fn summary(&self) -> String {
        format!(
            "provider flagged as {} (decision score {})",
            self.classification.label(),
            self.display_score()
        )
    }
}

/// Pure mapping from model outputs to a [`Verdict`].
pub struct VerdictInterpreter;

impl VerdictInterpreter {
    pub fn interpret(classification: Classification, score: f64) -> Verdict {
        let is_anomalous = classification == Classification::Anomalous;
        let decision_score = round_to(score, DISPLAY_DECIMALS);
        let reason = if is_anomalous {
            "billing profile isolates faster than the trained population".to_string()
        } else {
            "billing profile is consistent with the trained population".to_string()
        };

        Verdict {
            is_anomalous,
            classification,
            decision_score,
            raw_decision_score: score,
            reason,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anomalous_classification_sets_flag() {
        let verdict = VerdictInterpreter::interpret(Classification::Anomalous, -0.12);
        assert!(verdict.is_anomalous);
        assert_eq!(verdict.decision_score, -0.12);
        assert_eq!(verdict.display_score(), "-0.1200");
        assert!(verdict.summary().contains("ANOMALOUS"));
    }

    #[test]
    fn rounding_keeps_raw_value() {
        let verdict = VerdictInterpreter::interpret(Classification::Normal, 0.123_456_78);
        assert!(!verdict.is_anomalous);
        assert_eq!(verdict.decision_score, 0.1235);
        assert_eq!(verdict.raw_decision_score, 0.123_456_78);
        assert_eq!(verdict.display_score(), "0.1235");
    }

    #[test]
    fn classification_alone_decides_the_flag() {
        let verdict = VerdictInterpreter::interpret(Classification::Normal, -0.01);
        assert!(!verdict.is_anomalous);
        assert_eq!(verdict.classification, Classification::Normal);
    }
}
