//! The `/predict` endpoint.

pub mod handler;
pub mod response;

pub use handler::predict_handler;
pub use response::PredictResponse;
