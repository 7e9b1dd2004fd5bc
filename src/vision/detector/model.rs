//! ONNX Runtime session wrapper for the detection model.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info, warn};

use super::postprocess::{decode_predictions, parse_names_metadata};
use super::{DetectError, Detection, Detector};
use crate::config::DetectorConfig;

/// Detection model backed by ONNX Runtime.
///
/// Loaded once at startup and shared read-only across request handlers. The
/// session itself needs exclusive access per run, so it sits behind a mutex;
/// everything else is immutable after load.
pub struct OnnxDetector {
    session: Mutex<Session>,
    input_name: String,
    names: HashMap<usize, String>,
    model_name: String,
    input_size: u32,
    score_threshold: f32,
    iou_threshold: f32,
}

impl std::fmt::Debug for OnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetector")
            .field("model_name", &self.model_name)
            .field("input_size", &self.input_size)
            .field("classes", &self.names.len())
            .finish_non_exhaustive()
    }
}

impl OnnxDetector {
    /// Loads the model from disk.
    ///
    /// Fails if the weights file is missing or the session cannot be built.
    /// Callers treat this as fatal; the server never binds without a model.
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectError> {
        let model_path = config.model_path.as_path();
        if !model_path.exists() {
            return Err(DetectError::ModelNotFound(model_path.to_path_buf()));
        }

        info!("Loading detection model from {}", model_path.display());
        let session = Session::builder()?
            .with_execution_providers([CPUExecutionProvider::default().build()])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(model_path)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| DetectError::Inference("model has no inputs".to_string()))?;

        let names = Self::class_names(&session, config);
        if names.is_empty() {
            warn!("No class labels found in model metadata or labels file; using class_<id> placeholders");
        } else {
            info!("Loaded {} class labels", names.len());
        }

        let model_name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            names,
            model_name,
            input_size: config.input_size,
            score_threshold: config.score_threshold,
            iou_threshold: config.iou_threshold,
        })
    }

    /// Resolves the class-id to label table.
    ///
    /// Exporters following the Ultralytics convention store it under the
    /// `names` ONNX metadata key; a labels file (one label per line) is the
    /// fallback for models exported without metadata.
    fn class_names(session: &Session, config: &DetectorConfig) -> HashMap<usize, String> {
        if let Ok(metadata) = session.metadata() {
            if let Ok(Some(raw)) = metadata.custom("names") {
                let names = parse_names_metadata(&raw);
                if !names.is_empty() {
                    return names;
                }
            }
        }

        if let Some(labels_path) = &config.labels_path {
            match Self::read_labels_file(labels_path) {
                Ok(names) => return names,
                Err(e) => warn!("Failed to read labels file {}: {}", labels_path.display(), e),
            }
        }

        HashMap::new()
    }

    fn read_labels_file(path: &Path) -> std::io::Result<HashMap<usize, String>> {
        let content = std::fs::read_to_string(path)?;
        Ok(content
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .enumerate()
            .map(|(i, l)| (i, l.to_string()))
            .collect())
    }

    pub fn class_count(&self) -> usize {
        self.names.len()
    }
}

impl Detector for OnnxDetector {
    fn infer(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectError> {
        let (input, gain) = preprocess(image, self.input_size);

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectError::Inference("model session poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![
            &self.input_name => Value::from_array(input)?
        ])?;

        let output = outputs[0].try_extract_array::<f32>()?;
        let detections = decode_predictions(
            output,
            gain,
            (image.width(), image.height()),
            &self.names,
            self.score_threshold,
            self.iou_threshold,
        )?;

        debug!("Inference produced {} detections", detections.len());
        Ok(detections)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Resizes to the model's square input, forces RGB, normalizes to [0, 1],
/// and lays the pixels out as an NCHW tensor. Returns the tensor plus the
/// per-axis scale factors needed to map boxes back to original pixels.
fn preprocess(image: &DynamicImage, input_size: u32) -> (Array4<f32>, (f32, f32)) {
    let rgb = image.to_rgb8();
    let (orig_w, orig_h) = rgb.dimensions();

    let resized = image::imageops::resize(&rgb, input_size, input_size, FilterType::Triangle);

    let size = input_size as usize;
    let mut input = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    let gain = (
        orig_w as f32 / input_size as f32,
        orig_h as f32 / input_size as f32,
    );
    (input, gain)
}
