//! Script stage: obtain or generate the ad script.

use tracing::info;

use saiad_models::{GenerationConfig, PipelineStage, ProductInfo, Script, TemplateInfo};
use saiad_providers::ScriptGenerator;

use crate::error::{PipelineError, StageResult};
use crate::progress::ProgressTracker;

/// Run the script stage.
///
/// A caller-supplied script skips generation entirely and completes the
/// stage immediately without any provider call. Generation failure and a
/// sceneless script are hard pipeline failures; there is no retry at this
/// layer.
pub async fn run_script_stage(
    generator: &dyn ScriptGenerator,
    tracker: &ProgressTracker,
    product: &ProductInfo,
    template: &TemplateInfo,
    config: &GenerationConfig,
    existing_script: Option<Script>,
) -> StageResult<Script> {
    if let Some(script) = existing_script {
        info!("Using caller-supplied script, skipping generation");
        tracker.update(PipelineStage::ScriptGeneration, 100, "Using provided script");
        if script.is_empty() {
            return Err(PipelineError::EmptyScript);
        }
        return Ok(script);
    }

    tracker.update(PipelineStage::ScriptGeneration, 0, "Generating ad script");

    let script = generator
        .generate(
            product,
            &template.style,
            config.duration_seconds,
            &config.tone,
            config.target_audience.as_deref(),
        )
        .await
        .map_err(|e| PipelineError::ScriptFailed(e.to_string()))?;

    if script.is_empty() {
        return Err(PipelineError::EmptyScript);
    }

    tracker.update(
        PipelineStage::ScriptGeneration,
        100,
        format!("Script generated with {} scenes", script.scenes.len()),
    );

    Ok(script)
}
