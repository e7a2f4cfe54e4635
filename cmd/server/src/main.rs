//! candor-server - synchronous HTTP deception screening.
//!
//! The model artifact is loaded and its feature schema resolved exactly
//! once at startup; requests share the detector read-only. Each request's
//! pipeline run is fully synchronous and self-contained.

mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use candor_classifier::PipelineModel;
use candor_detect::Detector;

/// HTTP deception screening service.
#[derive(Parser, Debug)]
#[command(name = "candor-server")]
#[command(about = "Serve truthful/deceptive predictions over HTTP")]
struct Args {
    /// Listen address (e.g. :8080 or 127.0.0.1:8080)
    #[arg(short, long, default_value = ":8080")]
    listen: String,

    /// Trained model artifact (JSON)
    #[arg(short, long)]
    model: PathBuf,

    /// Directory for persisted uploads
    #[arg(long, default_value = "uploads")]
    uploads_dir: PathBuf,
}

/// Shared read-only service state.
pub struct AppState {
    pub(crate) detector: Detector<PipelineModel>,
    pub(crate) uploads_dir: PathBuf,
    pub(crate) model_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    std::fs::create_dir_all(&args.uploads_dir)
        .with_context(|| format!("creating uploads dir {}", args.uploads_dir.display()))?;

    let model = PipelineModel::from_path(&args.model)
        .with_context(|| format!("loading model artifact {}", args.model.display()))?;

    // A schema-less artifact can never serve a request; fail startup.
    let detector = Detector::new(model).context("resolving classifier feature schema")?;
    info!(
        model = %args.model.display(),
        columns = detector.schema().len(),
        "classifier ready"
    );

    let state = Arc::new(AppState {
        detector,
        uploads_dir: args.uploads_dir.clone(),
        model_path: args.model.clone(),
    });

    let addr = parse_addr(&args.listen)?;
    let app = routes::router(state);

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Parse address string to SocketAddr; ":8080" binds all interfaces.
fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };
    addr.parse().with_context(|| format!("invalid listen address {addr:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_addr_port_only() {
        let addr = parse_addr(":8080").expect("parse");
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn parse_addr_full() {
        let addr = parse_addr("127.0.0.1:9000").expect("parse");
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn parse_addr_invalid() {
        assert!(parse_addr("nonsense").is_err());
    }
}
