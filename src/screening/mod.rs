//! Screening verdict derived from a detection list.

use crate::vision::Detection;

/// Class label that counts as a positive finding.
pub const TARGET_LABEL: &str = "tuberculosis";

/// Minimum confidence for a detection to count as a positive finding.
pub const MATCH_THRESHOLD: f32 = 0.5;

/// The per-request screening decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub detected: bool,
    pub confidence: f32,
    /// Present only on a positive verdict.
    pub bbox: Option<[f32; 4]>,
}

/// Scans detections in model order and stops at the first one whose label is
/// [`TARGET_LABEL`] with confidence above [`MATCH_THRESHOLD`].
///
/// On no match the reported confidence is that of the last detection
/// examined, not zero and not the maximum. That matches the wire behavior of
/// the backend this node replaces; clients depend on the envelope, so it is
/// kept as-is rather than corrected here.
pub fn evaluate(detections: &[Detection]) -> Verdict {
    let mut confidence = 0.0;

    for detection in detections {
        confidence = detection.confidence;

        if detection.label == TARGET_LABEL && detection.confidence > MATCH_THRESHOLD {
            return Verdict {
                detected: true,
                confidence: detection.confidence,
                bbox: Some(detection.bbox),
            };
        }
    }

    Verdict {
        detected: false,
        confidence,
        bbox: None,
    }
}
