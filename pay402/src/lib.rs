#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Dispatch core of an x402 payment facilitator.
//!
//! A facilitator sits between clients paying for HTTP resources and the
//! blockchains that carry the payments. It checks that a payment envelope is
//! well formed, decides whether it serves the required network, and hands the
//! work to a network-specific execution engine.
//!
//! This crate is chain-agnostic. Network families (EVM, SVM) plug in through
//! [`chain::ChainFamily`], and the cryptographic work plugs in through
//! [`engine::PaymentEngine`].
//!
//! # Modules
//!
//! - [`proto`] - Wire format types (`PaymentPayload`, `VerifyResult`, ...)
//! - [`envelope`] - Structural validation of inbound envelopes
//! - [`network`] - Network families, descriptors and credentials
//! - [`registry`] - Immutable registry of configured networks
//! - [`chain`] - Family trait and the directory composing families
//! - [`engine`] - Payment execution engine trait
//! - [`facilitator`] - Dispatch engine and capability announcer
//! - [`error`] - Error taxonomy
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod chain;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod facilitator;
pub mod network;
pub mod proto;
pub mod registry;

pub use error::{ConfigurationError, FacilitatorError};
pub use facilitator::Facilitator;
pub use registry::FacilitatorOptions;
