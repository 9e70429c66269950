//! Live update multiplexer.
//!
//! One [`LiveStream`] per client connection merges several independently
//! polling producers (task status, project metadata, collaborative
//! document bytes) into a single ordered event queue, with cooperative
//! cancellation on disconnect and a wall-clock cutoff so no stream polls
//! forever.

mod config;
mod producers;
mod stream;
mod types;

pub use config::LiveConfig;
pub use stream::{LiveDeps, LiveStream};
pub use types::{LiveEvent, ProjectSnapshot};
