//! Video generation pipeline orchestrator.
//!
//! Takes a product, template, and generation config and drives script
//! generation, concurrent audio/music synthesis, per-segment video
//! generation, compositing, and export, reporting fine-grained progress
//! along the way. Partial failures (a single segment's audio or video)
//! are recorded and the run continues; script failure and an empty
//! composite set are the only hard failure points.

pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod segments;
pub mod stages;

pub use error::{PipelineError, StageResult};
pub use orchestrator::{PipelineOptions, ProviderSet, VideoPipeline};
pub use progress::{NullObserver, ProgressObserver, ProgressTracker};
pub use segments::parse_segments;
pub use stages::{CompositeArtifact, ExportArtifacts};
