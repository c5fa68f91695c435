//! Video generation worker.
//!
//! This crate provides:
//! - Job executor consuming generation jobs from the queue
//! - Pipeline processing with status write-through and a wall-clock ceiling
//! - Stale job sweeping for crashed workers
//! - Graceful shutdown

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod processor;
pub mod stale;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use processor::{process_generate_video, ProcessingContext};
pub use stale::StaleJobSweeper;
