#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana (SVM) network family for the pay402 facilitator.
//!
//! [`SvmChains`] turns the facilitator's SVM private key into a fee payer
//! [`SvmSigner`] for each Solana network in [`networks`]. The fee payer's
//! public key is advertised as `extra.feePayer` in `/supported`, so clients
//! know who co-signs their transactions.
//!
//! The private key is accepted as a base58 string or as a JSON byte array.
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod chain;
pub mod networks;
pub mod signer;

pub use chain::{SvmChains, SvmReadClient};
pub use signer::{KeypairParseError, SvmSigner, parse_keypair};
