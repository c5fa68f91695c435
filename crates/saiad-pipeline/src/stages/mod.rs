//! Stage executors.
//!
//! Each stage is a free function taking exactly the providers and state it
//! needs, so the audio and music stages can run concurrently over disjoint
//! borrows. Stages report progress through the shared [`ProgressTracker`]
//! and apply their own failure policy: partial failures become
//! [`SegmentOutcome`] records, hard failures become errors.
//!
//! [`ProgressTracker`]: crate::progress::ProgressTracker
//! [`SegmentOutcome`]: saiad_models::SegmentOutcome

pub mod audio;
pub mod composite;
pub mod export;
pub mod music;
pub mod script;
pub mod video;

pub use audio::run_audio_stage;
pub use composite::{run_composite_stage, CompositeArtifact};
pub use export::{run_export_stage, ExportArtifacts};
pub use music::run_music_stage;
pub use script::run_script_stage;
pub use video::run_video_stage;
