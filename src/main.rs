//! framestream runner
//!
//! Streams raw frame files named by the configured template through an
//! AddTransformation node and logs what came out.
//!
//! ```text
//! framestream [config.toml]
//! ```

use anyhow::{bail, Context};
use framestream::{
    config::{default_config_path, EngineConfig, LoggingConfig},
    data::{DataObject, LinearTransformation, StreamEnd},
    device::DeviceManager,
    error::FrameStreamError,
    pipeline::{AddTransformationNode, Pipeline, PipelineError, TransformationSourceNode},
    scene::SceneGraph,
    source::RawFileImporter,
    streamer::ImageStreamer,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "framestream.log";

/// The config named on the command line, else the default file. A broken
/// default file is returned as a fallback error to log once logging is up.
fn load_config() -> anyhow::Result<(EngineConfig, Option<FrameStreamError>)> {
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => {
            let config = EngineConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            Ok((config, None))
        }
        None => Ok(default_config_path()
            .map(EngineConfig::load_with_fallback)
            .unwrap_or_default()),
    }
}

fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

fn main() -> anyhow::Result<()> {
    let (config, fallback) = load_config()?;
    let _log_guard = init_logging(&config.logging);
    if let Some(e) = fallback {
        tracing::warn!("Failed to load engine config, using defaults: {}", e);
    }

    tracing::info!("Starting framestream");

    let devices = DeviceManager::initialize(DeviceManager::from_config(&config.devices)?)?;
    tracing::info!("{} execution device(s) available", devices.devices().len());

    if config.streamer.source_format.is_none() {
        bail!("No source format configured (set streamer.source_format)");
    }
    let importer = RawFileImporter::new(
        config.streamer.raw_width,
        config.streamer.raw_height,
        config.streamer.raw_channels,
    );
    let streamer = ImageStreamer::from_config(&config.streamer, importer)?;
    let events = streamer.events();

    let mut pipeline = Pipeline::new();
    let frames = pipeline.add_node(streamer);
    let transform = pipeline.add_node(TransformationSourceNode::new(
        LinearTransformation::identity(),
    ));
    let add = pipeline.add_node(AddTransformationNode::new());

    let frames_out = pipeline.output_port(frames, 0)?;
    let transform_out = pipeline.output_port(transform, 0)?;
    pipeline.set_input_connection(add, 0, frames_out)?;
    pipeline.set_input_connection(add, 1, transform_out)?;
    pipeline.set_streaming_mode(add, 0, config.streamer.streaming_mode)?;

    tracing::debug!("Pipeline topology:\n{}", pipeline.topology().to_json()?);

    let add_out = pipeline.output_port(add, 0)?;
    let output = match pipeline.output_data(add_out) {
        Ok(DataObject::Sequence(sequence)) => sequence,
        Ok(other) => bail!("Expected a frame sequence, got {}", other.type_name()),
        Err(PipelineError::EmptyStream(end)) => {
            tracing::warn!("Source produced no frames ({})", end);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut seen = output.len();
    while !output.is_closed() {
        pipeline.execute(add)?;
        if output.len() == seen {
            // Nothing new yet; wait for the producer instead of spinning.
            let _ = events.recv_timeout(Duration::from_millis(100));
        }
        seen = output.len();
    }

    let end = output.end().unwrap_or(StreamEnd::Aborted);
    tracing::info!("Stream {}: {} frame(s) transformed", end, output.len());
    if let Some(frame) = output.latest() {
        tracing::debug!(
            "Last frame {:?}, transform to root {:?}",
            frame,
            SceneGraph::full_transformation(&frame).matrix()
        );
    }
    if let Some(streamer) = pipeline.node(frames).and_then(|node| node.as_image_streamer()) {
        tracing::info!(
            "Streamer {} after {} frame(s)",
            streamer.state(),
            streamer.frames_produced()
        );
    }

    tracing::info!("framestream exiting");
    Ok(())
}
