use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tb_screen_node::api;
use tb_screen_node::config::NodeConfig;
use tb_screen_node::vision::{Detector, OnnxDetector};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = NodeConfig::from_env();

    // Model load happens before the listener binds. A missing or corrupt
    // weights file is fatal; the node must not accept traffic it cannot serve.
    let detector = OnnxDetector::new(&config.detector).with_context(|| {
        format!(
            "failed to load detection model from {}",
            config.detector.model_path.display()
        )
    })?;
    tracing::info!(
        "Detection model '{}' ready ({} classes)",
        detector.model_name(),
        detector.class_count()
    );

    api::start_server(&config, Arc::new(detector)).await
}
