//! Headless renderer
//!
//! Loads a graph document, evaluates it and writes the result as PNG:
//!
//! ```text
//! pixelgraph <document.json> <out.png> [width height]
//! ```

use anyhow::{bail, Context};
use pixelgraph::{config, EngineConfig, GraphDocument, NodeSystem};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_SIZE: (usize, usize) = (512, 512);

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pixelgraph=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (document_path, output_path) = match args.as_slice() {
        [doc, out, ..] => (doc, out),
        _ => bail!("usage: pixelgraph <document.json> <out.png> [width height]"),
    };
    let (width, height) = match &args[2..] {
        [] => DEFAULT_SIZE,
        [w, h] => (
            w.parse().with_context(|| format!("invalid width {:?}", w))?,
            h.parse().with_context(|| format!("invalid height {:?}", h))?,
        ),
        _ => bail!("width and height must be given together"),
    };

    let engine_config = match config::default_config_path() {
        Some(path) => EngineConfig::load_or_default(path),
        None => EngineConfig::default(),
    };

    let system = build_system(&engine_config);
    let document = GraphDocument::load(document_path)?;
    document.restore(&system)?;

    tracing::info!(width, height, mode = ?system.eval_mode(), "Rendering {}", document_path);
    let image = system.process(width, height);
    if let Some(stats) = system.last_pass_stats() {
        tracing::info!(
            operators = stats.operators,
            invocations = stats.invocations,
            elapsed_ms = stats.elapsed_us / 1000,
            "Pass complete"
        );
    }

    image
        .save_png(output_path)
        .with_context(|| format!("writing {}", output_path))?;
    tracing::info!("Wrote {}", output_path);
    Ok(())
}

#[cfg(feature = "mock-capture")]
fn build_system(config: &EngineConfig) -> NodeSystem {
    use pixelgraph::capture::MockCaptureBackend;
    use std::sync::Arc;

    tracing::info!("Using mock capture backend");
    NodeSystem::with_capture_backend(config, Arc::new(MockCaptureBackend::default()))
}

#[cfg(not(feature = "mock-capture"))]
fn build_system(config: &EngineConfig) -> NodeSystem {
    NodeSystem::new(config)
}
