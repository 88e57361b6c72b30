//! The clip batch orchestrator.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clipmill_media::{RenderRequest, StyleRenderer};
use clipmill_models::{
    clip_filename, parse_styles, sanitize_file_stem, Clip, ClipBatch, ClipId, ClipStatus,
    SourceVideo, Style, VideoId,
};
use metrics::counter;
use tokio::sync::{watch, Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::source::SourceResolver;
use crate::store::ClipStore;

/// Fans one source video out to N style renders and tracks independent
/// outcomes.
///
/// All collaborators are injected, so concurrent engines (and tests) never
/// share state. Renders run as spawned tasks bounded by a semaphore; a
/// render failure terminates in its own clip record and never crosses to a
/// sibling.
pub struct ClipEngine {
    config: EngineConfig,
    store: Arc<dyn ClipStore>,
    resolver: Arc<dyn SourceResolver>,
    renderer: Arc<dyn StyleRenderer>,
    render_semaphore: Arc<Semaphore>,
    // One cancellation signal per batch epoch, keyed by video
    cancellations: Mutex<HashMap<VideoId, watch::Sender<bool>>>,
}

impl ClipEngine {
    /// Create an engine with injected collaborators.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ClipStore>,
        resolver: Arc<dyn SourceResolver>,
        renderer: Arc<dyn StyleRenderer>,
    ) -> Self {
        let render_semaphore = Arc::new(Semaphore::new(config.max_concurrent_renders));
        Self {
            config,
            store,
            resolver,
            renderer,
            render_semaphore,
            cancellations: Mutex::new(HashMap::new()),
        }
    }

    /// Request a batch: one clip per requested style.
    ///
    /// Validation is fail-fast: an empty or unknown style name, or an
    /// unresolvable video, rejects the whole request before any clip record
    /// exists. On success every clip is created `pending` and one render
    /// task per clip is spawned; the call returns without waiting for any
    /// render.
    ///
    /// Re-requesting a batch for the same video replaces the previous
    /// epoch's records and cancels its unstarted renders.
    pub async fn request_batch(
        &self,
        video_id: &VideoId,
        style_names: &[String],
    ) -> EngineResult<ClipBatch> {
        if style_names.is_empty() {
            return Err(EngineError::invalid_request("no styles requested"));
        }
        let styles =
            parse_styles(style_names).map_err(|e| EngineError::invalid_request(e.to_string()))?;

        let source = self.resolver.resolve(video_id).await?;

        let output_dir = self.output_dir(video_id);
        tokio::fs::create_dir_all(&output_dir).await?;

        // Start a fresh epoch: stop the previous one's unstarted renders and
        // drop its records.
        let cancel_rx = {
            let (cancel_tx, cancel_rx) = watch::channel(false);
            let mut cancels = self.cancellations.lock().await;
            if let Some(old) = cancels.insert(video_id.clone(), cancel_tx) {
                let _ = old.send(true);
            }
            cancel_rx
        };
        self.store.remove_clips_for_video(video_id).await?;

        let mut clips = Vec::with_capacity(styles.len());
        for style in &styles {
            let clip = Clip::pending(video_id.clone(), *style);
            self.store.insert(clip.clone()).await?;
            clips.push(clip);
        }

        info!(
            video_id = %video_id,
            styles = styles.len(),
            "Batch requested"
        );
        counter!("clipmill_batch_requested").increment(1);

        for clip in &clips {
            let output_path = output_dir.join(clip_filename(video_id, clip.style));
            self.spawn_batch_render(clip.id.clone(), source.clone(), clip.style, output_path, cancel_rx.clone());
        }

        Ok(ClipBatch::new(video_id.clone(), clips))
    }

    /// Current batch aggregate for a video. Pure read; recomputed from
    /// member clip statuses on every call.
    pub async fn batch_status(&self, video_id: &VideoId) -> EngineResult<ClipBatch> {
        let clips = self.store.load_clips_for_video(video_id).await?;
        if clips.is_empty() {
            return Err(EngineError::VideoNotFound(video_id.clone()));
        }
        Ok(ClipBatch::new(video_id.clone(), clips))
    }

    /// Re-render exactly one previously failed clip.
    ///
    /// The clip is claimed `failed -> processing` with a compare-and-swap;
    /// any other current state surfaces [`EngineError::InvalidState`] and
    /// leaves the clip untouched. Siblings are never affected.
    pub async fn retry(&self, clip_id: &ClipId) -> EngineResult<Clip> {
        let clip = self
            .store
            .get(clip_id)
            .await?
            .ok_or_else(|| EngineError::ClipNotFound(clip_id.clone()))?;

        // Resolve before claiming so an unresolvable source rejects the
        // retry without touching clip state.
        let source = self.resolver.resolve(&clip.video_id).await?;

        let claimed = self
            .store
            .begin_processing(clip_id, ClipStatus::Failed)
            .await?;

        let output_dir = self.output_dir(&clip.video_id);
        tokio::fs::create_dir_all(&output_dir).await?;
        let output_path = output_dir.join(clip_filename(&clip.video_id, clip.style));

        info!(clip_id = %clip_id, style = %clip.style, "Retrying failed clip");

        let store = Arc::clone(&self.store);
        let renderer = Arc::clone(&self.renderer);
        let semaphore = Arc::clone(&self.render_semaphore);
        let render_timeout = self.config.render_timeout;
        let clip_id = clip_id.clone();
        let style = clip.style;
        tokio::spawn(async move {
            let started = Instant::now();
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            execute_render(
                store,
                renderer,
                render_timeout,
                clip_id,
                source,
                style,
                output_path,
                started,
            )
            .await;
        });

        Ok(claimed)
    }

    /// Cancel a batch's renders that have not started yet.
    ///
    /// Renders already underway are past the point of no return: they
    /// complete and report their natural terminal state.
    pub async fn cancel_batch(&self, video_id: &VideoId) -> EngineResult<()> {
        let cancels = self.cancellations.lock().await;
        match cancels.get(video_id) {
            Some(tx) => {
                let _ = tx.send(true);
                info!(video_id = %video_id, "Batch cancellation requested");
                Ok(())
            }
            None => Err(EngineError::VideoNotFound(video_id.clone())),
        }
    }

    fn output_dir(&self, video_id: &VideoId) -> PathBuf {
        self.config
            .output_root
            .join(sanitize_file_stem(video_id.as_str()))
    }

    fn spawn_batch_render(
        &self,
        clip_id: ClipId,
        source: SourceVideo,
        style: Style,
        output_path: PathBuf,
        cancel_rx: watch::Receiver<bool>,
    ) {
        let store = Arc::clone(&self.store);
        let renderer = Arc::clone(&self.renderer);
        let semaphore = Arc::clone(&self.render_semaphore);
        let render_timeout = self.config.render_timeout;

        tokio::spawn(async move {
            let started = Instant::now();
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            // Claim pending -> processing. Losing the claim means the epoch
            // was replaced under us; nothing left to do.
            if let Err(e) = store.begin_processing(&clip_id, ClipStatus::Pending).await {
                debug!(clip_id = %clip_id, error = %e, "Render task lost its claim");
                return;
            }

            // A cancelled batch fails its unstarted clips; anything past
            // this check runs to its natural terminal state.
            if *cancel_rx.borrow() {
                counter!("clipmill_clip_cancelled").increment(1);
                let elapsed = started.elapsed().as_millis() as u64;
                if let Err(e) = store.fail(&clip_id, "batch cancelled", elapsed).await {
                    warn!(clip_id = %clip_id, error = %e, "Failed to record cancellation");
                }
                return;
            }

            execute_render(
                store,
                renderer,
                render_timeout,
                clip_id,
                source,
                style,
                output_path,
                started,
            )
            .await;
        });
    }
}

/// Run one render and record its terminal state.
///
/// The clip must already be claimed `processing` by the caller. Every
/// renderer fault is converted to clip state here, at the point of origin;
/// nothing propagates to sibling renders or the engine.
#[allow(clippy::too_many_arguments)]
async fn execute_render(
    store: Arc<dyn ClipStore>,
    renderer: Arc<dyn StyleRenderer>,
    render_timeout: Duration,
    clip_id: ClipId,
    source: SourceVideo,
    style: Style,
    output_path: PathBuf,
    started: Instant,
) {
    let request = match RenderRequest::new(source, style, &output_path) {
        Ok(request) => request,
        Err(e) => {
            record_failure(&store, &clip_id, &e.to_string(), started).await;
            return;
        }
    };

    match tokio::time::timeout(render_timeout, renderer.render(&request)).await {
        Ok(Ok(rendered)) => {
            if let Err(e) = store.complete(&clip_id, &rendered).await {
                warn!(clip_id = %clip_id, error = %e, "Failed to record completion");
            }
        }
        Ok(Err(e)) => {
            debug!(clip_id = %clip_id, style = %style, error = %e, "Render failed");
            record_failure(&store, &clip_id, &e.to_string(), started).await;
        }
        Err(_) => {
            record_failure(
                &store,
                &clip_id,
                &format!("render timed out after {}s", render_timeout.as_secs()),
                started,
            )
            .await;
        }
    }
}

async fn record_failure(
    store: &Arc<dyn ClipStore>,
    clip_id: &ClipId,
    error: &str,
    started: Instant,
) {
    let elapsed = started.elapsed().as_millis() as u64;
    if let Err(e) = store.fail(clip_id, error, elapsed).await {
        warn!(clip_id = %clip_id, error = %e, "Failed to record render failure");
    }
}
