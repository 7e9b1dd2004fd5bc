//! Decoding of the raw model output into detections.
//!
//! The detection head emits a `[1, 4 + num_classes, anchors]` tensor: four
//! box coordinates (center x, center y, width, height) in input-tensor space
//! followed by one score per class. Decoding picks the best class per
//! anchor, drops low scores, maps boxes back to original image pixels, and
//! runs per-class greedy non-maximum suppression.

use std::collections::HashMap;

use ndarray::{ArrayViewD, Axis};

use super::{DetectError, Detection};

/// Decodes a raw prediction tensor into detections.
///
/// * `gain` - per-axis scale factors from input-tensor space back to
///   original image space (`orig / input_size`).
/// * `orig` - original image dimensions, used to clamp boxes.
///
/// The returned list is sorted confidence-descending.
pub fn decode_predictions(
    output: ArrayViewD<'_, f32>,
    gain: (f32, f32),
    orig: (u32, u32),
    names: &HashMap<usize, String>,
    score_threshold: f32,
    iou_threshold: f32,
) -> Result<Vec<Detection>, DetectError> {
    let shape = output.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 {
        return Err(DetectError::BadOutputShape(shape));
    }

    let num_classes = shape[1] - 4;
    let anchors = shape[2];
    let preds = output.index_axis(Axis(0), 0);

    let (max_x, max_y) = (orig.0 as f32, orig.1 as f32);
    let mut candidates = Vec::new();

    for j in 0..anchors {
        let mut class_id = 0usize;
        let mut score = 0.0f32;
        for c in 0..num_classes {
            let s = preds[[4 + c, j]];
            if s > score {
                score = s;
                class_id = c;
            }
        }
        if score < score_threshold {
            continue;
        }

        let (cx, cy, w, h) = (preds[[0, j]], preds[[1, j]], preds[[2, j]], preds[[3, j]]);
        let x1 = ((cx - w / 2.0) * gain.0).clamp(0.0, max_x);
        let y1 = ((cy - h / 2.0) * gain.1).clamp(0.0, max_y);
        let x2 = ((cx + w / 2.0) * gain.0).clamp(0.0, max_x);
        let y2 = ((cy + h / 2.0) * gain.1).clamp(0.0, max_y);

        candidates.push(Detection {
            class_id,
            label: resolve_label(names, class_id),
            confidence: score,
            bbox: [x1, y1, x2, y2],
        });
    }

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(nms(candidates, iou_threshold))
}

/// Greedy per-class non-maximum suppression over a confidence-sorted list.
fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut kept = Vec::with_capacity(detections.len());
    while !detections.is_empty() {
        let best = detections.remove(0);
        detections
            .retain(|d| d.class_id != best.class_id || iou(&best.bbox, &d.bbox) < iou_threshold);
        kept.push(best);
    }
    kept
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes.
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = ix * iy;

    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;

    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Parses the class table a model exporter stores under the `names` ONNX
/// metadata key, e.g. `{0: 'tuberculosis', 1: 'normal'}`.
pub fn parse_names_metadata(raw: &str) -> HashMap<usize, String> {
    let mut names = HashMap::new();
    let inner = raw.trim().trim_start_matches('{').trim_end_matches('}');
    for entry in inner.split(',') {
        let Some((id, label)) = entry.split_once(':') else {
            continue;
        };
        let Ok(id) = id.trim().parse::<usize>() else {
            continue;
        };
        let label = label.trim().trim_matches(|c| c == '\'' || c == '"').to_string();
        if !label.is_empty() {
            names.insert(id, label);
        }
    }
    names
}

pub(super) fn resolve_label(names: &HashMap<usize, String>, class_id: usize) -> String {
    names
        .get(&class_id)
        .cloned()
        .unwrap_or_else(|| format!("class_{class_id}"))
}
