//! Batch lifecycle integration tests.
//!
//! Drives the engine end to end with scripted renderers: placeholder file
//! writes stand in for real transforms, failures are injected per style.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use clipmill_engine::{
    ClipEngine, ClipStore, EngineConfig, EngineError, MemoryClipStore, StaticResolver,
};
use clipmill_media::{MediaError, MediaResult, RenderRequest, RenderedClip, StyleRenderer};
use clipmill_models::{BatchStatus, Clip, ClipBatch, ClipId, ClipStatus, SourceVideo, Style, VideoId};

/// Scripted renderer: sleeps briefly, writes a placeholder output file, and
/// fails any style currently in its fail set.
struct ScriptedRenderer {
    fail_styles: Mutex<HashSet<Style>>,
    delay: Duration,
    with_thumbnail: bool,
}

impl ScriptedRenderer {
    fn new() -> Self {
        Self {
            fail_styles: Mutex::new(HashSet::new()),
            delay: Duration::from_millis(5),
            with_thumbnail: true,
        }
    }

    fn failing_for(styles: &[Style]) -> Self {
        let renderer = Self::new();
        renderer
            .fail_styles
            .lock()
            .unwrap()
            .extend(styles.iter().copied());
        renderer
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn without_thumbnails(mut self) -> Self {
        self.with_thumbnail = false;
        self
    }

    fn heal(&self, style: Style) {
        self.fail_styles.lock().unwrap().remove(&style);
    }
}

#[async_trait]
impl StyleRenderer for ScriptedRenderer {
    async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedClip> {
        tokio::time::sleep(self.delay).await;

        if self.fail_styles.lock().unwrap().contains(&request.style) {
            return Err(MediaError::ffmpeg_failed(
                "scripted backend failure",
                Some("simulated stderr".to_string()),
                Some(1),
            ));
        }

        tokio::fs::write(&request.output_path, b"placeholder media").await?;
        let thumbnail_path = if self.with_thumbnail {
            let path = request.thumbnail_path();
            tokio::fs::write(&path, b"placeholder frame").await?;
            Some(path)
        } else {
            None
        };

        Ok(RenderedClip {
            output_path: request.output_path.clone(),
            thumbnail_path,
            duration_seconds: request
                .style
                .expected_duration(request.source.duration_seconds),
            processing_ms: self.delay.as_millis() as u64,
        })
    }
}

/// Store wrapper that records every observed status per clip, in write
/// order, so tests can assert transition sequences.
struct RecordingStore {
    inner: MemoryClipStore,
    history: Mutex<HashMap<ClipId, Vec<ClipStatus>>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: MemoryClipStore::new(),
            history: Mutex::new(HashMap::new()),
        }
    }

    fn record(&self, clip: &Clip) {
        self.history
            .lock()
            .unwrap()
            .entry(clip.id.clone())
            .or_default()
            .push(clip.status);
    }

    fn history_for(&self, id: &ClipId) -> Vec<ClipStatus> {
        self.history.lock().unwrap().get(id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ClipStore for RecordingStore {
    async fn insert(&self, clip: Clip) -> Result<(), EngineError> {
        self.record(&clip);
        self.inner.insert(clip).await
    }

    async fn get(&self, id: &ClipId) -> Result<Option<Clip>, EngineError> {
        self.inner.get(id).await
    }

    async fn load_clips_for_video(&self, video_id: &VideoId) -> Result<Vec<Clip>, EngineError> {
        self.inner.load_clips_for_video(video_id).await
    }

    async fn remove_clips_for_video(&self, video_id: &VideoId) -> Result<(), EngineError> {
        self.inner.remove_clips_for_video(video_id).await
    }

    async fn begin_processing(
        &self,
        id: &ClipId,
        expected: ClipStatus,
    ) -> Result<Clip, EngineError> {
        let clip = self.inner.begin_processing(id, expected).await?;
        self.record(&clip);
        Ok(clip)
    }

    async fn complete(&self, id: &ClipId, rendered: &RenderedClip) -> Result<Clip, EngineError> {
        let clip = self.inner.complete(id, rendered).await?;
        self.record(&clip);
        Ok(clip)
    }

    async fn fail(&self, id: &ClipId, error: &str, processing_ms: u64) -> Result<Clip, EngineError> {
        let clip = self.inner.fail(id, error, processing_ms).await?;
        self.record(&clip);
        Ok(clip)
    }
}

struct Fixture {
    engine: ClipEngine,
    store: Arc<RecordingStore>,
    video_id: VideoId,
    _dir: tempfile::TempDir,
}

async fn fixture(renderer: Arc<dyn StyleRenderer>) -> Fixture {
    fixture_with_concurrency(renderer, 4).await
}

async fn fixture_with_concurrency(
    renderer: Arc<dyn StyleRenderer>,
    max_concurrent: usize,
) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("source.mp4");
    tokio::fs::write(&source_path, b"fake source video").await.unwrap();

    let video_id = VideoId::from("upload-42");
    let resolver = StaticResolver::new().with_video(SourceVideo::new(
        video_id.clone(),
        &source_path,
        30.0,
        "mp4",
        17,
    ));

    let store = Arc::new(RecordingStore::new());
    let config = EngineConfig::default()
        .with_output_root(dir.path().join("out"))
        .with_max_concurrent_renders(max_concurrent);

    let engine = ClipEngine::new(
        config,
        Arc::clone(&store) as Arc<dyn ClipStore>,
        Arc::new(resolver),
        renderer,
    );

    Fixture {
        engine,
        store,
        video_id,
        _dir: dir,
    }
}

fn names(styles: &[&str]) -> Vec<String> {
    styles.iter().map(|s| s.to_string()).collect()
}

async fn wait_terminal(engine: &ClipEngine, video_id: &VideoId) -> ClipBatch {
    for _ in 0..500 {
        let batch = engine.batch_status(video_id).await.unwrap();
        if batch.status().is_terminal() {
            return batch;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("batch never reached a terminal state");
}

#[tokio::test]
async fn full_batch_completes_with_style_durations() {
    let fx = fixture(Arc::new(ScriptedRenderer::new())).await;

    let batch = fx
        .engine
        .request_batch(
            &fx.video_id,
            &names(&["slow_motion", "fast_motion", "border_effect"]),
        )
        .await
        .unwrap();
    assert_eq!(batch.clips.len(), 3);
    assert_eq!(batch.status(), BatchStatus::Pending);

    let batch = wait_terminal(&fx.engine, &fx.video_id).await;
    assert_eq!(batch.status(), BatchStatus::Completed);

    let by_style: HashMap<Style, f64> = batch
        .clips
        .iter()
        .map(|c| (c.style, c.duration_seconds.unwrap()))
        .collect();
    assert_eq!(by_style[&Style::SlowMotion], 60.0);
    assert_eq!(by_style[&Style::FastMotion], 15.0);
    assert_eq!(by_style[&Style::BorderEffect], 30.0);

    for clip in &batch.clips {
        assert!(clip.output_path.as_ref().unwrap().exists());
        assert!(clip.thumbnail_path.as_ref().unwrap().exists());
        assert!(clip.processing_ms.is_some());
    }
}

#[tokio::test]
async fn all_styles_batch_renders_everything() {
    let fx = fixture(Arc::new(ScriptedRenderer::new())).await;

    fx.engine
        .request_batch(&fx.video_id, &names(&["all"]))
        .await
        .unwrap();
    let batch = wait_terminal(&fx.engine, &fx.video_id).await;

    assert_eq!(batch.clips.len(), Style::ALL.len());
    assert_eq!(batch.status(), BatchStatus::Completed);
}

#[tokio::test]
async fn one_failing_style_leaves_siblings_untouched() {
    let renderer = Arc::new(ScriptedRenderer::failing_for(&[Style::ZoomFocus]));
    let fx = fixture(Arc::clone(&renderer) as Arc<dyn StyleRenderer>).await;

    fx.engine
        .request_batch(&fx.video_id, &names(&["all"]))
        .await
        .unwrap();
    let batch = wait_terminal(&fx.engine, &fx.video_id).await;

    assert_eq!(batch.status(), BatchStatus::PartiallyFailed);
    assert_eq!(batch.failed_count(), 1);
    assert_eq!(batch.completed_count(), Style::ALL.len() - 1);

    let failed = batch
        .clips
        .iter()
        .find(|c| c.status == ClipStatus::Failed)
        .unwrap();
    assert_eq!(failed.style, Style::ZoomFocus);
    assert!(failed.error.as_deref().unwrap().contains("scripted backend failure"));
}

#[tokio::test]
async fn retry_after_heal_completes_the_batch() {
    let renderer = Arc::new(ScriptedRenderer::failing_for(&[Style::ZoomFocus]));
    let fx = fixture(Arc::clone(&renderer) as Arc<dyn StyleRenderer>).await;

    fx.engine
        .request_batch(&fx.video_id, &names(&["zoom_focus", "caption_bottom"]))
        .await
        .unwrap();
    let batch = wait_terminal(&fx.engine, &fx.video_id).await;
    assert_eq!(batch.status(), BatchStatus::PartiallyFailed);

    let failed_id = batch
        .clips
        .iter()
        .find(|c| c.status == ClipStatus::Failed)
        .unwrap()
        .id
        .clone();

    renderer.heal(Style::ZoomFocus);
    let claimed = fx.engine.retry(&failed_id).await.unwrap();
    assert_eq!(claimed.status, ClipStatus::Processing);

    let batch = wait_terminal(&fx.engine, &fx.video_id).await;
    assert_eq!(batch.status(), BatchStatus::Completed);

    // Transition history: pending -> processing -> failed -> processing -> completed
    assert_eq!(
        fx.store.history_for(&failed_id),
        vec![
            ClipStatus::Pending,
            ClipStatus::Processing,
            ClipStatus::Failed,
            ClipStatus::Processing,
            ClipStatus::Completed,
        ]
    );
}

#[tokio::test]
async fn status_transitions_are_monotonic_for_every_clip() {
    let renderer = Arc::new(ScriptedRenderer::failing_for(&[Style::SplitTop]));
    let fx = fixture(Arc::clone(&renderer) as Arc<dyn StyleRenderer>).await;

    fx.engine
        .request_batch(&fx.video_id, &names(&["all"]))
        .await
        .unwrap();
    let batch = wait_terminal(&fx.engine, &fx.video_id).await;

    for clip in &batch.clips {
        let history = fx.store.history_for(&clip.id);
        assert_eq!(history.first(), Some(&ClipStatus::Pending));
        for pair in history.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "illegal transition {:?} -> {:?} for {}",
                pair[0],
                pair[1],
                clip.style
            );
        }
        assert!(history.last().unwrap().is_terminal());
    }
}

#[tokio::test]
async fn batch_status_is_idempotent_when_nothing_renders() {
    let fx = fixture(Arc::new(ScriptedRenderer::new())).await;

    fx.engine
        .request_batch(&fx.video_id, &names(&["caption_top"]))
        .await
        .unwrap();
    wait_terminal(&fx.engine, &fx.video_id).await;

    let first = fx.engine.batch_status(&fx.video_id).await.unwrap();
    let second = fx.engine.batch_status(&fx.video_id).await.unwrap();
    assert_eq!(first.status(), second.status());
    assert_eq!(first.summary(), second.summary());
    assert_eq!(
        first.clips.iter().map(|c| c.status).collect::<Vec<_>>(),
        second.clips.iter().map(|c| c.status).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn retry_unknown_clip_is_not_found() {
    let fx = fixture(Arc::new(ScriptedRenderer::new())).await;
    let err = fx.engine.retry(&ClipId::from_string("ghost")).await.unwrap_err();
    assert!(matches!(err, EngineError::ClipNotFound(_)));
}

#[tokio::test]
async fn missing_thumbnail_does_not_fail_the_clip() {
    let fx = fixture(Arc::new(ScriptedRenderer::new().without_thumbnails())).await;

    fx.engine
        .request_batch(&fx.video_id, &names(&["dynamic_captions"]))
        .await
        .unwrap();
    let batch = wait_terminal(&fx.engine, &fx.video_id).await;

    let clip = &batch.clips[0];
    assert_eq!(clip.status, ClipStatus::Completed);
    assert!(clip.thumbnail_path.is_none());
    assert!(clip.output_path.is_some());
}

#[tokio::test]
async fn cancellation_fails_unstarted_clips_and_spares_running_ones() {
    // One render slot and a slow renderer: the first clip starts, the rest
    // queue behind the semaphore.
    let renderer = Arc::new(ScriptedRenderer::new().with_delay(Duration::from_millis(200)));
    let fx = fixture_with_concurrency(renderer, 1).await;

    fx.engine
        .request_batch(
            &fx.video_id,
            &names(&["border_effect", "zoom_focus", "caption_top"]),
        )
        .await
        .unwrap();

    // Let the first render claim its slot, then cancel
    tokio::time::sleep(Duration::from_millis(50)).await;
    fx.engine.cancel_batch(&fx.video_id).await.unwrap();

    let batch = wait_terminal(&fx.engine, &fx.video_id).await;
    assert_eq!(batch.status(), BatchStatus::PartiallyFailed);

    // The in-flight render ran to its natural completion
    assert_eq!(batch.completed_count(), 1);
    assert_eq!(batch.failed_count(), 2);
    for clip in batch.clips.iter().filter(|c| c.status == ClipStatus::Failed) {
        assert_eq!(clip.error.as_deref(), Some("batch cancelled"));
    }
}

#[tokio::test]
async fn cancel_unknown_batch_is_not_found() {
    let fx = fixture(Arc::new(ScriptedRenderer::new())).await;
    let err = fx.engine.cancel_batch(&VideoId::from("ghost")).await.unwrap_err();
    assert!(matches!(err, EngineError::VideoNotFound(_)));
}

#[tokio::test]
async fn rerequesting_a_batch_replaces_the_previous_epoch() {
    let fx = fixture(Arc::new(ScriptedRenderer::new())).await;

    fx.engine
        .request_batch(&fx.video_id, &names(&["caption_top", "zoom_focus"]))
        .await
        .unwrap();
    wait_terminal(&fx.engine, &fx.video_id).await;

    let batch = fx
        .engine
        .request_batch(&fx.video_id, &names(&["border_effect"]))
        .await
        .unwrap();
    assert_eq!(batch.clips.len(), 1);

    let batch = wait_terminal(&fx.engine, &fx.video_id).await;
    assert_eq!(batch.clips.len(), 1);
    assert_eq!(batch.clips[0].style, Style::BorderEffect);
    assert_eq!(batch.status(), BatchStatus::Completed);
}
