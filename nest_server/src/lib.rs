//! HTTP command surface for the community event engine.
//!
//! - [`api`]: axum router and handlers
//! - [`config`]: environment-driven configuration
//! - [`logging`]: tracing subscriber and structured log helpers
//! - [`metrics`]: Prometheus counters

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
