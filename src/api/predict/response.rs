//! Wire format of the /predict response.

use serde::Serialize;

use crate::screening::Verdict;

const RESULT_POSITIVE: &str = "has tuberculosis";
const RESULT_NEGATIVE: &str = "no tuberculosis";

/// The response envelope. Serializes as
/// `{"status":"success","result":...,"confidence":...,"bbox":...}` or
/// `{"status":"error","message":...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PredictResponse {
    Success {
        result: String,
        confidence: f64,
        bbox: Option<[f64; 4]>,
    },
    Error {
        message: String,
    },
}

impl PredictResponse {
    /// Builds the success envelope from a verdict, applying the output
    /// rounding rules: confidence to 4 decimals, box coordinates to 2.
    pub fn from_verdict(verdict: &Verdict) -> Self {
        PredictResponse::Success {
            result: if verdict.detected {
                RESULT_POSITIVE.to_string()
            } else {
                RESULT_NEGATIVE.to_string()
            },
            confidence: round_to(verdict.confidence as f64, 4),
            bbox: verdict
                .bbox
                .map(|coords| coords.map(|c| round_to(c as f64, 2))),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
