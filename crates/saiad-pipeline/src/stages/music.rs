//! Music stage: background track selection.

use tracing::warn;

use saiad_models::PipelineStage;
use saiad_providers::{MusicSelector, MusicTrack, StockMusicLibrary};

use crate::progress::ProgressTracker;

/// Select or generate a background music track.
///
/// This stage has no failure state: any selector failure degrades to the
/// deterministic stock library lookup, which always yields a track. Runs
/// concurrently with the audio stage.
pub async fn run_music_stage(
    selector: &dyn MusicSelector,
    tracker: &ProgressTracker,
    category: &str,
    duration_seconds: u32,
) -> MusicTrack {
    let message = if selector.is_stock() {
        "Selecting stock music track"
    } else {
        "Generating background music"
    };
    tracker.update(PipelineStage::MusicGeneration, 0, message);

    let track = match selector.select_or_generate(category, duration_seconds).await {
        Ok(track) => track,
        Err(e) => {
            warn!("Music selection failed, falling back to stock library: {}", e);
            StockMusicLibrary::new().track_for_category(category)
        }
    };

    tracker.update(
        PipelineStage::MusicGeneration,
        100,
        format!("Music track selected: {}", track.id.as_deref().unwrap_or("generated")),
    );

    track
}
