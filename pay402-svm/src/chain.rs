//! The SVM [`ChainFamily`] implementation.

use std::any::Any;
use std::sync::Arc;

use pay402::chain::{
    ChainError, ChainFamily, ChainHandle, ExecutionConfig, ReadClient, Signer,
};
use pay402::network::{Credential, NetworkFamily};
use serde_json::{Value, json};
use url::Url;

use crate::networks::{SvmNetwork, svm_network};
use crate::signer::{SvmSigner, parse_keypair};

/// RPC endpoint of one Solana network, without any key material.
#[derive(Debug, Clone)]
pub struct SvmReadClient {
    network: String,
    rpc_url: Url,
}

impl SvmReadClient {
    /// Endpoint to query.
    #[must_use]
    pub const fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }
}

impl ReadClient for SvmReadClient {
    fn network(&self) -> &str {
        &self.network
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds fee payer signers for the known Solana networks.
///
/// Solana payments are co-signed by the facilitator, so verification also
/// needs the signer, and every advertised kind carries the fee payer address.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvmChains;

impl SvmChains {
    /// Family using each network's public RPC endpoint unless the
    /// execution config names another.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn lookup(network: &str) -> Result<&'static SvmNetwork, ChainError> {
        svm_network(network).ok_or_else(|| ChainError::UnknownNetwork {
            family: NetworkFamily::Svm,
            network: network.to_owned(),
        })
    }

    fn rpc_url(network: &SvmNetwork, config: Option<&ExecutionConfig>) -> Result<Url, ChainError> {
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
impl ChainFamily for SvmChains {
    fn family(&self) -> NetworkFamily {
        NetworkFamily::Svm
    }

    fn is_known_network(&self, network: &str) -> bool {
        svm_network(network).is_some()
    }

    async fn build_read_client(&self, network: &str) -> Result<Arc<dyn ReadClient>, ChainError> {
        let known = Self::lookup(network)?;
        Ok(Arc::new(SvmReadClient {
            network: known.name.to_owned(),
            rpc_url: Self::rpc_url(known, None)?,
        }))
    }

    async fn build_signer(
        &self,
        network: &str,
        credential: &Credential,
        config: Option<&ExecutionConfig>,
    ) -> Result<Arc<dyn Signer>, ChainError> {
        let known = Self::lookup(network)?;
        let keypair =
            parse_keypair(credential.expose()).map_err(|e| ChainError::InvalidCredential {
                family: NetworkFamily::Svm,
                network: network.to_owned(),
                reason: e.to_string(),
            })?;
        let rpc_url = Self::rpc_url(known, config)?;
        let signer = SvmSigner::new(known.name, keypair, rpc_url);

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            network,
            fee_payer = ?Signer::address(&signer),
            rpc_url = %signer.rpc_url(),
            "Using SVM signer"
        );

        Ok(Arc::new(signer))
    }

    async fn verify_handle(
        &self,
        network: &str,
        credential: &Credential,
        config: Option<&ExecutionConfig>,
    ) -> Result<ChainHandle, ChainError> {
        let signer = self.build_signer(network, credential, config).await?;
        Ok(ChainHandle::Signer(signer))
    }

    async fn supported_extra(
        &self,
        network: &str,
        credential: &Credential,
        config: Option<&ExecutionConfig>,
    ) -> Result<Option<Value>, ChainError> {
        let signer = self.build_signer(network, credential, config).await?;
        let fee_payer = signer
            .address()
            .ok_or_else(|| ChainError::NoSignerAddress(network.to_owned()))?;
        Ok(Some(json!({ "feePayer": fee_payer })))
    }
}
