//! Export stage: final encoding profile and delivery URLs.

use tracing::info;

use saiad_models::{ExportFormat, PipelineStage};

use crate::progress::ProgressTracker;
use crate::stages::composite::CompositeArtifact;

/// Final deliverables of a successful run.
#[derive(Debug, Clone)]
pub struct ExportArtifacts {
    pub video_url: String,
    pub thumbnail_url: String,
}

/// Run the export stage.
///
/// A missing composite short-circuits to `None` without reporting any
/// progress or touching external services. Otherwise the stage applies the
/// target format's fixed encoding profile and derives the final video and
/// thumbnail URLs from the pipeline id.
pub async fn run_export_stage(
    tracker: &ProgressTracker,
    pipeline_id: &str,
    composite: Option<&CompositeArtifact>,
    format: ExportFormat,
) -> Option<ExportArtifacts> {
    let composite = composite?;
    let profile = format.profile();

    tracker.update(
        PipelineStage::FinalExport,
        0,
        format!("Exporting for {}", format),
    );

    info!(
        composite = %composite.url,
        resolution = profile.resolution,
        codec = profile.codec,
        bitrate = profile.bitrate,
        "Applying export profile"
    );

    tracker.update(PipelineStage::FinalExport, 50, "Encoding final video");
    tracker.update(PipelineStage::FinalExport, 90, "Generating thumbnail");

    let artifacts = ExportArtifacts {
        video_url: format!(
            "https://cdn.saiad.io/videos/{}/final_{}.mp4",
            pipeline_id, format
        ),
        thumbnail_url: format!("https://cdn.saiad.io/videos/{}/thumbnail.jpg", pipeline_id),
    };

    tracker.update(PipelineStage::FinalExport, 100, "Export complete");
    Some(artifacts)
}
