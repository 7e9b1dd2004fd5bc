//! Vision processing: upload decoding and ONNX detection.
//!
//! Everything here runs on CPU.

pub mod detector;
pub mod image_utils;

pub use detector::{Detection, DetectError, Detector, OnnxDetector};
pub use image_utils::{decode_image_bytes, ImageError, ImageInfo};
