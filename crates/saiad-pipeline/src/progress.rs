//! Progress tracking and the observer port.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::info;

use saiad_models::{upsert_stage_progress, PipelineStage, StageProgress};

/// One-way notification channel for live progress updates.
///
/// Implementations push updates to a UI or the job status sink. The
/// channel is fire-and-forget: observer panics are caught and discarded
/// at the call site so a broken observer cannot fail a pipeline run.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &StageProgress);
}

/// Observer that discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_progress(&self, _progress: &StageProgress) {}
}

/// Owns a run's stage history and broadcasts updates to the observer.
///
/// Stage records are updated in place (one record per stage); the audio
/// and music stages update concurrently, hence the mutex.
pub struct ProgressTracker {
    pipeline_id: String,
    stages: Mutex<Vec<StageProgress>>,
    observer: Arc<dyn ProgressObserver>,
}

impl ProgressTracker {
    pub fn new(pipeline_id: impl Into<String>, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            stages: Mutex::new(Vec::new()),
            observer,
        }
    }

    /// Record a progress update and notify the observer.
    pub fn update(&self, stage: PipelineStage, progress: u8, message: impl Into<String>) {
        let message = message.into();
        let record = {
            let mut stages = self.stages.lock().unwrap_or_else(|e| e.into_inner());
            upsert_stage_progress(&mut stages, stage, progress, message)
        };

        info!(
            pipeline_id = %self.pipeline_id,
            stage = %record.stage,
            progress = record.progress,
            "{}",
            record.message
        );

        // Fire-and-forget: a panicking observer must not fail the run.
        let _ = catch_unwind(AssertUnwindSafe(|| self.observer.on_progress(&record)));
    }

    /// Snapshot of the stage history so far.
    pub fn history(&self) -> Vec<StageProgress> {
        self.stages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct PanickingObserver {
        calls: AtomicU32,
    }

    impl ProgressObserver for PanickingObserver {
        fn on_progress(&self, _progress: &StageProgress) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("observer is broken");
        }
    }

    #[test]
    fn broken_observer_does_not_poison_tracking() {
        let observer = Arc::new(PanickingObserver {
            calls: AtomicU32::new(0),
        });
        let tracker = ProgressTracker::new("p-1", observer.clone());

        tracker.update(PipelineStage::ScriptGeneration, 0, "start");
        tracker.update(PipelineStage::ScriptGeneration, 100, "done");

        assert_eq!(observer.calls.load(Ordering::SeqCst), 2);
        let history = tracker.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].progress, 100);
    }
}
