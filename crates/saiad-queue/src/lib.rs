//! Redis-backed job infrastructure for the generation pipeline.
//!
//! This crate provides:
//! - Job enqueueing via Redis Streams with dedup, retry counters, and a DLQ
//! - The durable job status store polled by the status API
//! - Live progress events via Redis Pub/Sub

pub mod error;
pub mod job;
pub mod progress;
pub mod queue;
pub mod status;

pub use error::{QueueError, QueueResult};
pub use job::{GenerateVideoJob, QueueJob};
pub use progress::{ProgressChannel, ProgressEvent};
pub use queue::{JobQueue, QueueConfig};
pub use status::{JobStatusStore, JOB_STATUS_TTL_SECS, STALE_THRESHOLD_SECS};
