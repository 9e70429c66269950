//! Pipeline orchestrator.
//!
//! Owns task creation rules (admission checks and the summarize fan-out),
//! dispatch to the worker queues, and ingestion of the three inbound
//! worker event streams that advance or abort a pipeline.

mod admission;
mod config;
mod runner;
mod types;

pub use admission::check_admission;
pub use config::OrchestratorConfig;
pub use runner::PipelineOrchestrator;
pub use types::{AdmissionError, CreateTaskRequest, OrchestratorError};
