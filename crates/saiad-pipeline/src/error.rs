//! Pipeline error types.
//!
//! These are the hard failure points of a run. Per-segment provider
//! failures are not errors at this level; they are recorded as
//! [`saiad_models::SegmentOutcome`] values and the run continues.

use thiserror::Error;

use saiad_providers::ProviderError;

pub type StageResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Script generation failed: {0}")]
    ScriptFailed(String),

    #[error("Script contained no scenes")]
    EmptyScript,

    #[error("No videos to composite")]
    NoComposableVideo,

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}
