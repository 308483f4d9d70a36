//! Alloy-backed clients and signers for EVM networks.
//!
//! Both wrap a type-erased [`DynProvider`] so that the engine can issue calls
//! without knowing which filler stack was used to build it.

use std::any::Any;
use std::fmt;

use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use pay402::chain::{ReadClient, Signer};
use url::Url;

/// Read-only provider for one EVM network.
#[derive(Clone)]
pub struct EvmReadClient {
    network: String,
    chain_id: u64,
    rpc_url: Url,
    provider: DynProvider,
}

impl EvmReadClient {
    /// Connects a read-only provider to `rpc_url`. No request is made.
    #[must_use]
    pub fn new(network: impl Into<String>, chain_id: u64, rpc_url: Url) -> Self {
        let provider = ProviderBuilder::new()
            .connect_http(rpc_url.clone())
            .erased();
        Self {
            network: network.into(),
            chain_id,
            rpc_url,
            provider,
        }
    }

    /// EIP-155 chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Endpoint the provider talks to.
    #[must_use]
    pub const fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    /// The underlying provider.
    #[must_use]
    pub const fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

impl fmt::Debug for EvmReadClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmReadClient")
            .field("network", &self.network)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ReadClient for EvmReadClient {
    fn network(&self) -> &str {
        &self.network
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Wallet-backed provider for one EVM network.
#[derive(Clone)]
pub struct EvmSigner {
    network: String,
    chain_id: u64,
    address: Address,
    provider: DynProvider,
}

impl EvmSigner {
    /// Connects a wallet provider for `signer` to `rpc_url`. No request is made.
    #[must_use]
    pub fn new(
        network: impl Into<String>,
        chain_id: u64,
        signer: PrivateKeySigner,
        rpc_url: Url,
    ) -> Self {
        let address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url)
            .erased();
        Self {
            network: network.into(),
            chain_id,
            address,
            provider,
        }
    }

    /// EIP-155 chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Address of the facilitator's signing key.
    #[must_use]
    pub const fn signer_address(&self) -> Address {
        self.address
    }

    /// The underlying provider, which signs with the facilitator key.
    #[must_use]
    pub const fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

impl fmt::Debug for EvmSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmSigner")
            .field("network", &self.network)
            .field("chain_id", &self.chain_id)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Signer for EvmSigner {
    fn network(&self) -> &str {
        &self.network
    }

    fn address(&self) -> Option<String> {
        Some(self.address.to_checksum(None))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
