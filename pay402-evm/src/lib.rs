#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM network family for the pay402 facilitator.
//!
//! Provides [`EvmChains`], a [`pay402::chain::ChainFamily`] that builds
//! alloy providers for the EVM networks listed in [`networks`]:
//!
//! - a read-only [`EvmReadClient`] for verification,
//! - a wallet-backed [`EvmSigner`] for settlement.
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod chain;
pub mod networks;
pub mod provider;

pub use chain::EvmChains;
pub use provider::{EvmReadClient, EvmSigner};
