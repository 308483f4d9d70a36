//! Error taxonomy of the dispatch engine.
//!
//! Unsupported networks are not errors: they produce typed negative results
//! (see [`crate::proto::VerifyResult::invalid`] and
//! [`crate::proto::SettleResult::unsupported_network`]).

use crate::chain::ChainError;
use crate::engine::EngineError;
use crate::envelope::SchemaViolation;
use crate::proto::Network;

/// The facilitator cannot be built from the given options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// Neither an EVM nor an SVM private key was supplied.
    #[error("at least one private key (EVM or SVM) is required")]
    MissingCredentials,

    /// No network was supplied for either family.
    #[error("at least one network (EVM or SVM) is required")]
    MissingNetworks,

    /// Every configured network belongs to a family without a credential.
    #[error("no configured network has a credential for its family: {}", .0.join(", "))]
    NoUsableNetwork(Vec<Network>),
}

/// A verify or settle request could not be completed.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorError {
    /// The envelope is structurally invalid.
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    /// A client or signer could not be built for the target network.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The execution engine failed or rejected the request.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl FacilitatorError {
    /// Returns the schema violation, if that is what this error is.
    #[must_use]
    pub const fn as_schema_violation(&self) -> Option<&SchemaViolation> {
        match self {
            Self::Schema(violation) => Some(violation),
            Self::Chain(_) | Self::Engine(_) => None,
        }
    }
}
