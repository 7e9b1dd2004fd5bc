//! Request-path errors.
//!
//! Everything that can go wrong between receiving an upload and producing a
//! verdict collapses into [`PredictError`]. The handler turns any of these
//! into the `{"status":"error"}` envelope; clients only ever see the
//! stringified message.

use thiserror::Error;

use crate::vision::{DetectError, ImageError};

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("no file field in multipart body")]
    MissingFile,

    #[error("failed to read upload: {0}")]
    Upload(String),

    #[error("{0}")]
    Decode(#[from] ImageError),

    #[error("{0}")]
    Inference(#[from] DetectError),
}
