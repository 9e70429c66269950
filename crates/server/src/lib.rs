//! HTTP and WebSocket surface for the recap backend.
//!
//! Exposed as a library so integration tests can build the router
//! in-process; the `recapd` binary is a thin wrapper around these modules.

pub mod api;
pub mod metrics;
pub mod state;
