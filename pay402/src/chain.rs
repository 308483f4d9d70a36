//! Chain families and the directory that composes them.
//!
//! A [`ChainFamily`] knows which networks it serves and how to build a
//! read-only client or a write-capable signer for one of them. The
//! [`ChainDirectory`] holds one implementation per [`NetworkFamily`] and is
//! what the dispatch engine routes through.
//!
//! Clients and signers are opaque to the core. They are handed to the
//! [`PaymentEngine`](crate::engine::PaymentEngine), which downcasts them via
//! `as_any` when it needs the concrete type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::network::{Credential, NetworkFamily};
use crate::proto::Network;

/// A read-only connection to one network.
pub trait ReadClient: Send + Sync + fmt::Debug {
    /// Network this client talks to.
    fn network(&self) -> &str;

    /// Concrete client, for engines that need it.
    fn as_any(&self) -> &dyn Any;
}

/// A write-capable signer bound to one network.
pub trait Signer: Send + Sync + fmt::Debug {
    /// Network this signer signs for.
    fn network(&self) -> &str;

    /// Public address of the signer, if it could be derived.
    fn address(&self) -> Option<String>;

    /// Concrete signer, for engines that need it.
    fn as_any(&self) -> &dyn Any;
}

/// What the engine receives for verification.
///
/// EVM verification only needs to read chain state. SVM verification needs
/// the fee payer's signer.
#[derive(Debug, Clone)]
pub enum ChainHandle {
    /// Read-only client.
    Client(Arc<dyn ReadClient>),
    /// Write-capable signer.
    Signer(Arc<dyn Signer>),
}

impl ChainHandle {
    /// Network the handle is bound to.
    #[must_use]
    pub fn network(&self) -> &str {
        match self {
            Self::Client(client) => client.network(),
            Self::Signer(signer) => signer.network(),
        }
    }
}

/// Per-request execution settings forwarded to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    /// RPC endpoint to use instead of the network default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,
}

impl ExecutionConfig {
    /// Config pointing at a specific RPC endpoint.
    #[must_use]
    pub const fn with_rpc_url(rpc_url: Url) -> Self {
        Self {
            rpc_url: Some(rpc_url),
        }
    }
}

/// A client or signer could not be built.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The private key could not be parsed for this family.
    #[error("invalid {family} private key for {network}: {reason}")]
    InvalidCredential {
        /// Family the key was parsed for.
        family: NetworkFamily,
        /// Network the signer was requested for.
        network: Network,
        /// Parser message.
        reason: String,
    },

    /// The family does not know this network.
    #[error("unknown {family} network: {network}")]
    UnknownNetwork {
        /// Family that was asked.
        family: NetworkFamily,
        /// Requested network.
        network: Network,
    },

    /// A signer was built but exposes no address.
    #[error("signer for {0} has no address")]
    NoSignerAddress(Network),

    /// An RPC endpoint could not be used.
    #[error("invalid RPC URL for {network}: {reason}")]
    InvalidRpcUrl {
        /// Network the URL belongs to.
        network: Network,
        /// Parser message.
        reason: String,
    },

    /// No implementation is registered for the family.
    #[error("no {0} chain family is registered")]
    UnsupportedFamily(NetworkFamily),

    /// No credential is held for the family.
    #[error("no {0} private key is configured")]
    MissingCredential(NetworkFamily),
}

/// One network family's client and signer construction.
#[async_trait::async_trait]
pub trait ChainFamily: Send + Sync + fmt::Debug {
    /// Family this implementation serves.
    fn family(&self) -> NetworkFamily;

    /// Whether `network` is a network of this family.
    fn is_known_network(&self, network: &str) -> bool;

    /// Builds a read-only client for `network`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] if the network is unknown or its endpoint unusable.
    async fn build_read_client(&self, network: &str) -> Result<Arc<dyn ReadClient>, ChainError>;

    /// Builds a write-capable signer for `network`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] if the credential cannot be parsed, the network
    /// is unknown or its endpoint unusable.
    async fn build_signer(
        &self,
        network: &str,
        credential: &Credential,
        config: Option<&ExecutionConfig>,
    ) -> Result<Arc<dyn Signer>, ChainError>;

    /// Builds what the engine needs to verify a payment on `network`.
    ///
    /// Defaults to a read-only client.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] if the handle cannot be built.
    async fn verify_handle(
        &self,
        network: &str,
        _credential: &Credential,
        _config: Option<&ExecutionConfig>,
    ) -> Result<ChainHandle, ChainError> {
        Ok(ChainHandle::Client(self.build_read_client(network).await?))
    }

    /// Family-specific data advertised with the `network` kind.
    ///
    /// Defaults to none.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] if the data cannot be derived. The network is
    /// then left out of the announcement.
    async fn supported_extra(
        &self,
        _network: &str,
        _credential: &Credential,
        _config: Option<&ExecutionConfig>,
    ) -> Result<Option<Value>, ChainError> {
        Ok(None)
    }
}

/// Composition of [`ChainFamily`] implementations, one per family.
#[derive(Debug, Clone, Default)]
pub struct ChainDirectory {
    families: Vec<Arc<dyn ChainFamily>>,
}

impl ChainDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a family, replacing any previous implementation of it.
    #[must_use]
    pub fn with_family<F: ChainFamily + 'static>(mut self, family: F) -> Self {
        let kind = family.family();
        self.families.retain(|f| f.family() != kind);
        self.families.push(Arc::new(family));
        self
    }

    /// Implementation serving `kind`.
    #[must_use]
    pub fn family(&self, kind: NetworkFamily) -> Option<&Arc<dyn ChainFamily>> {
        self.families.iter().find(|f| f.family() == kind)
    }

    /// Family that knows `network`, in registration order.
    #[must_use]
    pub fn family_of(&self, network: &str) -> Option<NetworkFamily> {
        self.families
            .iter()
            .find(|f| f.is_known_network(network))
            .map(|f| f.family())
    }

    /// Whether any registered family knows `network`.
    #[must_use]
    pub fn is_known_network(&self, network: &str) -> bool {
        self.family_of(network).is_some()
    }
}
