//! End-to-end pipeline tests over fake providers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use saiad_models::{
    AspectRatio, GenerationConfig, PipelineStage, ProductInfo, Scene, Script, Segment,
    StageProgress, TemplateInfo,
};
use saiad_pipeline::stages::run_audio_stage;
use saiad_pipeline::{
    NullObserver, PipelineOptions, ProgressObserver, ProgressTracker, ProviderSet, VideoPipeline,
};
use saiad_providers::{
    MusicSelector, MusicTrack, ProviderError, ProviderResult, ScriptGenerator, SpeechAudio,
    SpeechSynthesizer, StockMusicLibrary, VideoGenerator, VideoTask, VideoTaskStatus, Voice,
};

// ---------------------------------------------------------------------------
// Fakes

struct FakeScriptGenerator {
    script: Script,
    fail: bool,
    calls: AtomicU32,
    closed: AtomicU32,
}

impl FakeScriptGenerator {
    fn returning(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            fail: false,
            calls: AtomicU32::new(0),
            closed: AtomicU32::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            script: Script::default(),
            fail: true,
            calls: AtomicU32::new(0),
            closed: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl ScriptGenerator for FakeScriptGenerator {
    async fn generate(
        &self,
        _product: &ProductInfo,
        _template_style: &str,
        _duration_seconds: u32,
        _tone: &str,
        _target_audience: Option<&str>,
    ) -> ProviderResult<Script> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::api(500, "script backend down"));
        }
        Ok(self.script.clone())
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeSpeechSynthesizer {
    /// Narration containing this substring fails synthesis.
    fail_marker: Option<String>,
    calls: AtomicU32,
    closed: AtomicU32,
}

impl FakeSpeechSynthesizer {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail_marker: None,
            calls: AtomicU32::new(0),
            closed: AtomicU32::new(0),
        })
    }

    fn failing_on(marker: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_marker: Some(marker.to_string()),
            calls: AtomicU32::new(0),
            closed: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeechSynthesizer {
    async fn synthesize(&self, text: &str, _voice_id: &str) -> ProviderResult<SpeechAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                return Err(ProviderError::api(429, "voice quota exceeded"));
            }
        }
        Ok(SpeechAudio {
            audio_data: vec![1, 2, 3],
        })
    }

    fn preset_voice(&self, _preset_key: &str) -> Voice {
        Voice {
            voice_id: "fake-voice",
            name: "Fake Voice",
            language: "en",
            style: "test",
        }
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeMusicSelector {
    fail: bool,
    closed: AtomicU32,
}

impl FakeMusicSelector {
    fn stock() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            closed: AtomicU32::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            closed: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl MusicSelector for FakeMusicSelector {
    async fn select_or_generate(
        &self,
        category: &str,
        _duration_seconds: u32,
    ) -> ProviderResult<MusicTrack> {
        if self.fail {
            return Err(ProviderError::Timeout("music generation stalled".into()));
        }
        Ok(StockMusicLibrary::new().track_for_category(category))
    }

    fn is_stock(&self) -> bool {
        !self.fail
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

enum VideoBehavior {
    Succeed,
    FailAll,
    Panic,
}

struct FakeVideoGenerator {
    behavior: VideoBehavior,
    generate_calls: AtomicU32,
    closed: AtomicU32,
}

impl FakeVideoGenerator {
    fn with(behavior: VideoBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            generate_calls: AtomicU32::new(0),
            closed: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl VideoGenerator for FakeVideoGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _duration_seconds: u32,
        _aspect_ratio: AspectRatio,
    ) -> ProviderResult<VideoTask> {
        let call = self.generate_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            VideoBehavior::Succeed => Ok(VideoTask {
                task_id: format!("task-{}", call),
                status: VideoTaskStatus::Pending,
                video_url: None,
                error: None,
            }),
            VideoBehavior::FailAll => Ok(VideoTask::failed(
                format!("task-{}", call),
                "render farm rejected the prompt",
            )),
            VideoBehavior::Panic => panic!("injected video stage bug"),
        }
    }

    async fn poll(&self, task_id: &str) -> ProviderResult<VideoTask> {
        Ok(VideoTask {
            task_id: task_id.to_string(),
            status: VideoTaskStatus::Completed,
            video_url: Some(format!("https://cdn.fake/{}.mp4", task_id)),
            error: None,
        })
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Observer recording every progress event in arrival order.
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<StageProgress>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<StageProgress> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, progress: &StageProgress) {
        self.events.lock().unwrap().push(progress.clone());
    }
}

// ---------------------------------------------------------------------------
// Helpers

fn scene(visual: &str, narration: &str, duration: f64) -> Scene {
    Scene {
        order: 0,
        visual_description: visual.to_string(),
        narration: narration.to_string(),
        duration: Some(duration),
    }
}

fn three_scene_script() -> Script {
    Script {
        headline: "The future in your hand".to_string(),
        subline: "Now with more of everything".to_string(),
        narration: "Full spot narration".to_string(),
        cta: "Order today".to_string(),
        scenes: vec![
            scene("phone rotating on pedestal", "Meet the new flagship", 10.0),
            scene("macro shot of camera module", "", 10.0),
            scene("hand placing phone on charger", "Available now", 10.0),
        ],
    }
}

fn smartphone() -> ProductInfo {
    ProductInfo {
        name: "Nova X".to_string(),
        category: "smartphone".to_string(),
        features: vec!["200MP camera".to_string()],
        specs: serde_json::Map::new(),
    }
}

fn unboxing() -> TemplateInfo {
    TemplateInfo {
        id: "tpl-unboxing".to_string(),
        style: "unboxing".to_string(),
    }
}

fn fast_options() -> PipelineOptions {
    PipelineOptions {
        audio_rate_delay: Duration::from_millis(1),
        video_poll_interval: Duration::from_millis(1),
        video_max_wait: Duration::from_millis(100),
    }
}

struct Fixture {
    script: Arc<FakeScriptGenerator>,
    speech: Arc<FakeSpeechSynthesizer>,
    music: Arc<FakeMusicSelector>,
    video: Arc<FakeVideoGenerator>,
}

impl Fixture {
    fn happy_path() -> Self {
        Self {
            script: FakeScriptGenerator::returning(three_scene_script()),
            speech: FakeSpeechSynthesizer::ok(),
            music: FakeMusicSelector::stock(),
            video: FakeVideoGenerator::with(VideoBehavior::Succeed),
        }
    }

    fn provider_set(&self) -> ProviderSet {
        ProviderSet {
            script: self.script.clone(),
            speech: self.speech.clone(),
            music: self.music.clone(),
            video: self.video.clone(),
        }
    }

    fn assert_all_closed_once(&self) {
        assert_eq!(self.script.closed.load(Ordering::SeqCst), 1);
        assert_eq!(self.speech.closed.load(Ordering::SeqCst), 1);
        assert_eq!(self.music.closed.load(Ordering::SeqCst), 1);
        assert_eq!(self.video.closed.load(Ordering::SeqCst), 1);
    }

    fn pipeline(&self, observer: Arc<dyn ProgressObserver>) -> VideoPipeline {
        VideoPipeline::new("proj-1", self.provider_set(), observer)
            .with_options(fast_options())
    }
}

// ---------------------------------------------------------------------------
// Tests

#[tokio::test]
async fn smartphone_unboxing_run_succeeds_end_to_end() {
    let fixture = Fixture::happy_path();
    let pipeline = fixture.pipeline(Arc::new(NullObserver));
    let pipeline_id = pipeline.pipeline_id().to_string();

    let result = pipeline
        .run(&smartphone(), &unboxing(), &GenerationConfig::default(), None)
        .await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.pipeline_id, pipeline_id);
    assert_eq!(
        result.video_url.as_deref(),
        Some(format!("https://cdn.saiad.io/videos/{}/final_youtube.mp4", pipeline_id).as_str())
    );
    assert_eq!(
        result.thumbnail_url.as_deref(),
        Some(format!("https://cdn.saiad.io/videos/{}/thumbnail.jpg", pipeline_id).as_str())
    );
    assert_eq!(result.metadata["segments"], serde_json::json!(3));
    assert_eq!(result.metadata["format"], serde_json::json!("youtube"));

    // Middle scene has no narration, so only two synthesis calls happen.
    assert_eq!(fixture.speech.calls.load(Ordering::SeqCst), 2);
    // All three segments still get a video generation attempt.
    assert_eq!(fixture.video.generate_calls.load(Ordering::SeqCst), 3);

    let completed: Vec<_> = result
        .stages
        .iter()
        .filter(|s| s.progress == 100)
        .map(|s| s.stage)
        .collect();
    for stage in [
        PipelineStage::ScriptGeneration,
        PipelineStage::AudioGeneration,
        PipelineStage::MusicGeneration,
        PipelineStage::VideoGeneration,
        PipelineStage::VideoCompositing,
        PipelineStage::FinalExport,
        PipelineStage::Completed,
    ] {
        assert!(completed.contains(&stage), "{} not completed", stage);
    }

    fixture.assert_all_closed_once();
}

#[tokio::test]
async fn progress_is_monotonic_and_completed_stages_end_at_100() {
    let fixture = Fixture::happy_path();
    let observer = Arc::new(RecordingObserver::default());
    let pipeline = fixture.pipeline(observer.clone());

    let result = pipeline
        .run(&smartphone(), &unboxing(), &GenerationConfig::default(), None)
        .await;
    assert!(result.success);

    let events = observer.events();
    assert!(!events.is_empty());

    for stage in [
        PipelineStage::ScriptGeneration,
        PipelineStage::AudioGeneration,
        PipelineStage::MusicGeneration,
        PipelineStage::VideoGeneration,
        PipelineStage::VideoCompositing,
        PipelineStage::FinalExport,
    ] {
        let observed: Vec<u8> = events
            .iter()
            .filter(|e| e.stage == stage)
            .map(|e| e.progress)
            .collect();
        assert!(
            observed.windows(2).all(|w| w[0] <= w[1]),
            "{} progress went backwards: {:?}",
            stage,
            observed
        );
        assert_eq!(*observed.last().unwrap(), 100, "{} did not finish", stage);
    }
}

#[tokio::test]
async fn one_failed_audio_segment_does_not_abort_the_run() {
    let script = Script {
        scenes: vec![
            scene("a", "first line", 10.0),
            scene("b", "boom goes the quota", 10.0),
            scene("c", "last line", 10.0),
        ],
        ..three_scene_script()
    };
    let fixture = Fixture {
        script: FakeScriptGenerator::returning(script),
        speech: FakeSpeechSynthesizer::failing_on("boom"),
        ..Fixture::happy_path()
    };
    let pipeline = fixture.pipeline(Arc::new(NullObserver));

    let result = pipeline
        .run(&smartphone(), &unboxing(), &GenerationConfig::default(), None)
        .await;

    // The run proceeds to video generation and completes.
    assert!(result.success);
    assert_eq!(fixture.video.generate_calls.load(Ordering::SeqCst), 3);
    fixture.assert_all_closed_once();
}

#[tokio::test]
async fn audio_stage_returns_one_outcome_per_segment_in_index_order() {
    let speech = FakeSpeechSynthesizer::failing_on("boom");
    let tracker = ProgressTracker::new("p-test", Arc::new(NullObserver));
    let mut segments = vec![
        Segment::new(0, 0.0, 10.0, "a", Some("first".into())),
        Segment::new(1, 10.0, 20.0, "b", Some("boom".into())),
        Segment::new(2, 20.0, 30.0, "c", None),
    ];

    let outcomes = run_audio_stage(
        speech.as_ref(),
        &tracker,
        &mut segments,
        "ko_professional_female",
        Duration::from_millis(1),
    )
    .await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        outcomes.iter().map(|o| o.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(outcomes[0].success);
    assert!(!outcomes[1].success);
    assert!(outcomes[1].error.as_deref().unwrap().contains("429"));
    // Skipped segment counts as trivially successful with no audio.
    assert!(outcomes[2].success);
    assert!(segments[0].audio_data.is_some());
    assert!(segments[1].audio_data.is_none());
    assert!(segments[2].audio_data.is_none());
}

#[tokio::test]
async fn all_video_failures_escalate_to_pipeline_failure() {
    let fixture = Fixture {
        video: FakeVideoGenerator::with(VideoBehavior::FailAll),
        ..Fixture::happy_path()
    };
    let pipeline = fixture.pipeline(Arc::new(NullObserver));

    let result = pipeline
        .run(&smartphone(), &unboxing(), &GenerationConfig::default(), None)
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("No videos to composite"));
    assert!(result.video_url.is_none());
    // Stage history is preserved up to the failure point.
    assert!(result
        .stages
        .iter()
        .any(|s| s.stage == PipelineStage::VideoGeneration && s.progress == 100));
    assert!(result.stages.iter().any(|s| s.stage == PipelineStage::Failed));
    fixture.assert_all_closed_once();
}

#[tokio::test]
async fn existing_script_skips_the_generator_entirely() {
    let fixture = Fixture {
        script: FakeScriptGenerator::failing(),
        ..Fixture::happy_path()
    };
    let observer = Arc::new(RecordingObserver::default());
    let pipeline = fixture.pipeline(observer.clone());

    let result = pipeline
        .run(
            &smartphone(),
            &unboxing(),
            &GenerationConfig::default(),
            Some(three_scene_script()),
        )
        .await;

    assert!(result.success);
    assert_eq!(fixture.script.calls.load(Ordering::SeqCst), 0);

    // The script stage reports exactly one event, already at 100%.
    let script_events: Vec<_> = observer
        .events()
        .into_iter()
        .filter(|e| e.stage == PipelineStage::ScriptGeneration)
        .collect();
    assert_eq!(script_events.len(), 1);
    assert_eq!(script_events[0].progress, 100);
}

#[tokio::test]
async fn script_failure_aborts_with_providers_released() {
    let fixture = Fixture {
        script: FakeScriptGenerator::failing(),
        ..Fixture::happy_path()
    };
    let pipeline = fixture.pipeline(Arc::new(NullObserver));

    let result = pipeline
        .run(&smartphone(), &unboxing(), &GenerationConfig::default(), None)
        .await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("Script generation failed"));
    // No downstream stage ran.
    assert_eq!(fixture.speech.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fixture.video.generate_calls.load(Ordering::SeqCst), 0);
    fixture.assert_all_closed_once();
}

#[tokio::test]
async fn panic_inside_a_stage_becomes_a_failure_result_and_still_releases_providers() {
    let fixture = Fixture {
        video: FakeVideoGenerator::with(VideoBehavior::Panic),
        ..Fixture::happy_path()
    };
    let pipeline = fixture.pipeline(Arc::new(NullObserver));

    let result = pipeline
        .run(&smartphone(), &unboxing(), &GenerationConfig::default(), None)
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("injected video stage bug"));
    fixture.assert_all_closed_once();
}

#[tokio::test]
async fn music_failure_degrades_to_stock_track() {
    let fixture = Fixture {
        music: FakeMusicSelector::failing(),
        ..Fixture::happy_path()
    };
    let observer = Arc::new(RecordingObserver::default());
    let pipeline = fixture.pipeline(observer.clone());

    let result = pipeline
        .run(&smartphone(), &unboxing(), &GenerationConfig::default(), None)
        .await;

    // Music has no failure state, only degraded success.
    assert!(result.success);
    let final_music = observer
        .events()
        .into_iter()
        .filter(|e| e.stage == PipelineStage::MusicGeneration)
        .next_back()
        .unwrap();
    assert_eq!(final_music.progress, 100);
    assert!(final_music.message.contains("tech_upbeat"));
}

#[tokio::test]
async fn video_stage_starts_only_after_audio_and_music_finish() {
    let fixture = Fixture::happy_path();
    let observer = Arc::new(RecordingObserver::default());
    let pipeline = fixture.pipeline(observer.clone());

    let result = pipeline
        .run(&smartphone(), &unboxing(), &GenerationConfig::default(), None)
        .await;
    assert!(result.success);

    let events = observer.events();
    let first_video = events
        .iter()
        .position(|e| e.stage == PipelineStage::VideoGeneration)
        .unwrap();
    let audio_done = events
        .iter()
        .position(|e| e.stage == PipelineStage::AudioGeneration && e.progress == 100)
        .unwrap();
    let music_done = events
        .iter()
        .position(|e| e.stage == PipelineStage::MusicGeneration && e.progress == 100)
        .unwrap();

    assert!(first_video > audio_done, "video started before audio finished");
    assert!(first_video > music_done, "video started before music finished");
}
