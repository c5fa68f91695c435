//! Shared data models for the SaiAd generation backend.
//!
//! This crate provides Serde-serializable types for:
//! - Pipeline stages, progress records, and results
//! - Video segments and parsed ad scripts
//! - Generation configuration and export profiles
//! - Job identifiers and the cached job status document

pub mod config;
pub mod job;
pub mod job_status;
pub mod pipeline;
pub mod script;
pub mod segment;

// Re-export common types
pub use config::{AspectRatio, ExportFormat, ExportProfile, GenerationConfig, ProductInfo, TemplateInfo};
pub use job::JobId;
pub use job_status::{JobStatus, JobStatusCache};
pub use pipeline::{
    successful_urls, upsert_stage_progress, PipelineResult, PipelineStage, SegmentOutcome,
    StageProgress,
};
pub use script::{Scene, Script};
pub use segment::Segment;
