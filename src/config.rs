//! Environment-driven configuration.
//!
//! All knobs come from environment variables (optionally via a `.env` file)
//! with sensible defaults, so the node runs with zero configuration when the
//! model sits at the default path.

use std::env;
use std::path::PathBuf;

/// Top-level node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Port the HTTP API binds on.
    pub api_port: u16,
    pub detector: DetectorConfig,
}

/// Detection model configuration.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Path to the ONNX weights file. Loaded once at startup.
    pub model_path: PathBuf,
    /// Optional class-label file (one label per line), used when the model
    /// carries no `names` metadata.
    pub labels_path: Option<PathBuf>,
    /// Square input resolution the model expects.
    pub input_size: u32,
    /// Minimum per-detection score kept during postprocessing.
    pub score_threshold: f32,
    /// IoU threshold for non-maximum suppression.
    pub iou_threshold: f32,
}

impl NodeConfig {
    /// Reads configuration from the environment.
    ///
    /// Variables: `API_PORT`, `MODEL_PATH`, `LABELS_PATH`, `INPUT_SIZE`,
    /// `SCORE_THRESHOLD`, `IOU_THRESHOLD`.
    pub fn from_env() -> Self {
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);

        let model_path = env::var("MODEL_PATH")
            .unwrap_or_else(|_| "./models/best.onnx".to_string())
            .into();

        let labels_path = env::var("LABELS_PATH").ok().map(PathBuf::from);

        let input_size = env::var("INPUT_SIZE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(640);

        let score_threshold = env::var("SCORE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(0.25);

        let iou_threshold = env::var("IOU_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(0.45);

        Self {
            api_port,
            detector: DetectorConfig {
                model_path,
                labels_path,
                input_size,
                score_threshold,
                iou_threshold,
            },
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/best.onnx"),
            labels_path: None,
            input_size: 640,
            score_threshold: 0.25,
            iou_threshold: 0.45,
        }
    }
}
