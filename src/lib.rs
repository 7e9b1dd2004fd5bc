//! Tuberculosis screening inference node.
//!
//! A small HTTP service that accepts a chest radiograph upload, runs it
//! through a pretrained ONNX object-detection model, and returns a binary
//! screening verdict with confidence and bounding box.

pub mod api;
pub mod config;
pub mod screening;
pub mod vision;

pub use config::{DetectorConfig, NodeConfig};
