//! Render selfcheck binary.
//!
//! Operator smoke test: renders a small batch from a local file through the
//! real FFmpeg backend and reports per-clip outcomes.
//!
//! Usage: `render-selfcheck <video-file> [style...]`
//! With no styles given, every style is rendered.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipmill_engine::{ClipEngine, EngineConfig, MemoryClipStore, StaticResolver};
use clipmill_media::{probe_video, FfmpegRenderer};
use clipmill_models::{ClipStatus, SourceVideo, VideoId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("clipmill=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(false))
            .with(env_filter)
            .init();
    }

    let mut args = std::env::args().skip(1);
    let video_path = args
        .next()
        .context("usage: render-selfcheck <video-file> [style...]")?;
    let mut styles: Vec<String> = args.collect();
    if styles.is_empty() {
        styles.push("all".to_string());
    }

    let video_path = Path::new(&video_path);
    let info = probe_video(video_path)
        .await
        .with_context(|| format!("failed to probe {}", video_path.display()))?;

    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("selfcheck");
    let video_id = VideoId::from(stem);
    let source = SourceVideo::new(
        video_id.clone(),
        video_path,
        info.duration,
        info.format.clone(),
        info.size,
    );

    info!(
        video_id = %video_id,
        duration = info.duration,
        format = %info.format,
        "Probed source video"
    );

    let config = EngineConfig::from_env();
    let renderer = FfmpegRenderer::new()
        .context("ffmpeg not available")?
        .with_timeout(config.render_timeout.as_secs());

    let engine = ClipEngine::new(
        config,
        Arc::new(MemoryClipStore::new()),
        Arc::new(StaticResolver::new().with_video(source)),
        Arc::new(renderer),
    );

    let batch = engine.request_batch(&video_id, &styles).await?;
    info!(clips = batch.clips.len(), "Batch requested, waiting for renders");

    let batch = loop {
        let batch = engine.batch_status(&video_id).await?;
        if batch.status().is_terminal() {
            break batch;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    };

    println!("{} ({})", batch.summary(), batch.status());
    for clip in &batch.clips {
        match clip.status {
            ClipStatus::Completed => println!(
                "  {:<20} completed  {:>6.1}s  {}",
                clip.style.to_string(),
                clip.duration_seconds.unwrap_or(0.0),
                clip.output_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            ),
            _ => println!(
                "  {:<20} {}  {}",
                clip.style.to_string(),
                clip.status,
                clip.error.as_deref().unwrap_or("")
            ),
        }
    }

    if batch.completed_count() == 0 {
        bail!("no clip completed");
    }
    Ok(())
}
