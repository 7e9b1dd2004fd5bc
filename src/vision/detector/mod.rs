//! ONNX object detection.
//!
//! The model is treated as a black box that maps an image to a list of
//! [`Detection`]s. [`OnnxDetector`] is the real implementation; the
//! [`Detector`] trait is the seam that lets the HTTP layer be tested without
//! model weights on disk.

mod model;
mod postprocess;

use std::path::PathBuf;

use image::DynamicImage;
use thiserror::Error;

pub use model::OnnxDetector;
pub use postprocess::{decode_predictions, iou, parse_names_metadata};

/// One candidate object reported by the model for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    /// Human-readable label resolved from the model's class table.
    pub label: String,
    /// Score in [0, 1].
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in original image pixel coordinates.
    pub bbox: [f32; 4],
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("onnx runtime error: {0}")]
    Runtime(#[from] ort::Error),

    #[error("model produced unexpected output shape {0:?}")]
    BadOutputShape(Vec<usize>),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Image-to-detections inference.
///
/// Implementations must be safe to call concurrently; the node shares one
/// instance across all request handlers.
pub trait Detector: Send + Sync {
    /// Runs one synchronous inference pass over the image.
    fn infer(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectError>;

    /// Name of the loaded model, for health reporting.
    fn model_name(&self) -> &str;
}
