//! The EVM [`ChainFamily`] implementation.

use std::sync::Arc;

use alloy_signer_local::PrivateKeySigner;
use pay402::chain::{ChainError, ChainFamily, ExecutionConfig, ReadClient, Signer};
use pay402::network::{Credential, NetworkFamily};
use url::Url;

use crate::networks::{EvmNetwork, evm_network};
use crate::provider::{EvmReadClient, EvmSigner};

/// Builds alloy providers for the known EVM networks.
///
/// Verification uses a read-only provider; settlement a wallet provider
/// holding the facilitator key. Nothing extra is advertised for EVM kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvmChains;

impl EvmChains {
    /// Family using each network's public RPC endpoint unless the
    /// execution config names another.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn lookup(network: &str) -> Result<&'static EvmNetwork, ChainError> {
        evm_network(network).ok_or_else(|| ChainError::UnknownNetwork {
            family: NetworkFamily::Evm,
            network: network.to_owned(),
        })
    }

    fn rpc_url(network: &EvmNetwork, config: Option<&ExecutionConfig>) -> Result<Url, ChainError> {
        if let Some(url) = config.and_then(|c| c.rpc_url.as_ref()) {
            return Ok(url.clone());
        }
        Url::parse(network.rpc_url).map_err(|e| ChainError::InvalidRpcUrl {
            network: network.name.to_owned(),
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ChainFamily for EvmChains {
    fn family(&self) -> NetworkFamily {
        NetworkFamily::Evm
    }

    fn is_known_network(&self, network: &str) -> bool {
        evm_network(network).is_some()
    }

    async fn build_read_client(&self, network: &str) -> Result<Arc<dyn ReadClient>, ChainError> {
        let known = Self::lookup(network)?;
        let rpc_url = Self::rpc_url(known, None)?;
        Ok(Arc::new(EvmReadClient::new(
            known.name,
            known.chain_id,
            rpc_url,
        )))
    }

    async fn build_signer(
        &self,
        network: &str,
        credential: &Credential,
        config: Option<&ExecutionConfig>,
    ) -> Result<Arc<dyn Signer>, ChainError> {
        let known = Self::lookup(network)?;
        let key = credential
            .expose()
            .parse::<PrivateKeySigner>()
            .map_err(|e| ChainError::InvalidCredential {
                family: NetworkFamily::Evm,
                network: network.to_owned(),
                reason: e.to_string(),
            })?;
        let rpc_url = Self::rpc_url(known, config)?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(network, signer = %key.address(), rpc_url = %rpc_url, "Using EVM signer");

        Ok(Arc::new(EvmSigner::new(
            known.name,
            known.chain_id,
            key,
            rpc_url,
        )))
    }
}
