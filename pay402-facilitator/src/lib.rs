//! HTTP front end of the x402 payment facilitator.
//!
//! Wraps the [`pay402`] dispatch core in an Axum router, loads configuration
//! from flags and environment, and forwards payment execution to a remote
//! engine.
//!
//! # Modules
//!
//! - [`handlers`] - Route handlers, router and CORS policy
//! - [`error`] - HTTP error normalization
//! - [`config`] - CLI and environment configuration
//! - [`engine`] - HTTP client for the payment execution service
//! - [`util`] - Shutdown signal handling

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod util;

pub use config::{Config, Environment};
pub use engine::RemoteEngine;
pub use handlers::{FacilitatorState, cors_layer, facilitator_router};
