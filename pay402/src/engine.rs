//! The payment execution engine seam.
//!
//! Signature checks, transaction construction and broadcasting live behind
//! [`PaymentEngine`]. The dispatch engine only decides which handle and
//! config to pass, then returns the engine's answer verbatim.

use crate::chain::{ChainHandle, ExecutionConfig, Signer};
use crate::proto::{PaymentPayload, PaymentRequirements, SettleResult, VerifyResult};

/// Boxed error source carried by [`EngineError::Transport`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The engine could not produce a result.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine refused the request with a message.
    #[error("{0}")]
    Rejected(String),

    /// The engine answered with a non-success HTTP status.
    #[error("engine returned HTTP {status}: {body}")]
    HttpStatus {
        /// Status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The engine could not be reached, or its answer could not be read.
    #[error("engine request failed: {0}")]
    Transport(#[source] BoxError),
}

/// Verifies and settles payments on behalf of the facilitator.
#[async_trait::async_trait]
pub trait PaymentEngine: Send + Sync {
    /// Checks a payment without moving funds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if verification could not be carried out. A
    /// payment that is merely invalid is an `Ok` with `is_valid == false`.
    async fn verify(
        &self,
        handle: &ChainHandle,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
        config: Option<&ExecutionConfig>,
    ) -> Result<VerifyResult, EngineError>;

    /// Executes a payment on chain.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if settlement could not be carried out.
    async fn settle(
        &self,
        signer: &dyn Signer,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
        config: Option<&ExecutionConfig>,
    ) -> Result<SettleResult, EngineError>;
}
