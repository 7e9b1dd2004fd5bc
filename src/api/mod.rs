//! HTTP API surface.

pub mod errors;
pub mod http_server;
pub mod predict;

pub use errors::PredictError;
pub use http_server::{build_router, start_server, AppState};
pub use predict::response::PredictResponse;
