//! Network capability registry.
//!
//! The registry is built once from [`FacilitatorOptions`] and never changes
//! afterwards. It answers which family (if any) serves a network, which
//! credential that family uses and which RPC endpoint overrides apply.

use std::collections::HashMap;

use url::Url;

use crate::error::ConfigurationError;
use crate::network::{Credential, NetworkDescriptor, NetworkFamily};
use crate::proto::Network;

/// Already-parsed facilitator configuration.
///
/// Loading it (environment, files, CLI) is the caller's job.
#[derive(Debug, Clone, Default)]
pub struct FacilitatorOptions {
    /// Credential used for every EVM network.
    pub evm_private_key: Option<Credential>,
    /// Credential used for every SVM network.
    pub svm_private_key: Option<Credential>,
    /// EVM networks to serve, in announcement order.
    pub evm_networks: Vec<Network>,
    /// SVM networks to serve, in announcement order.
    pub svm_networks: Vec<Network>,
    /// RPC endpoint overrides for SVM networks.
    pub svm_rpc_urls: HashMap<Network, Url>,
}

impl FacilitatorOptions {
    /// Sets the EVM credential.
    #[must_use]
    pub fn with_evm_private_key(mut self, key: impl Into<String>) -> Self {
        self.evm_private_key = Credential::non_empty(key);
        self
    }

    /// Sets the SVM credential.
    #[must_use]
    pub fn with_svm_private_key(mut self, key: impl Into<String>) -> Self {
        self.svm_private_key = Credential::non_empty(key);
        self
    }

    /// Appends an EVM network.
    #[must_use]
    pub fn with_evm_network(mut self, network: impl Into<Network>) -> Self {
        self.evm_networks.push(network.into());
        self
    }

    /// Appends an SVM network.
    #[must_use]
    pub fn with_svm_network(mut self, network: impl Into<Network>) -> Self {
        self.svm_networks.push(network.into());
        self
    }

    /// Sets the RPC endpoint override for an SVM network.
    #[must_use]
    pub fn with_svm_rpc_url(mut self, network: impl Into<Network>, url: Url) -> Self {
        self.svm_rpc_urls.insert(network.into(), url);
        self
    }
}

/// Immutable map from network name to the family that serves it.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    descriptors: Vec<NetworkDescriptor>,
    index: HashMap<Network, usize>,
    credentials: HashMap<NetworkFamily, Credential>,
    rpc_overrides: HashMap<Network, Url>,
}

impl NetworkRegistry {
    /// Builds the registry.
    ///
    /// Duplicate names keep their first occurrence. A network configured for a
    /// family without a credential is recorded but never reported as
    /// supported.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if no credential or no network is given,
    /// or if no network ends up usable.
    pub fn new(options: FacilitatorOptions) -> Result<Self, ConfigurationError> {
        let FacilitatorOptions {
            evm_private_key,
            svm_private_key,
            evm_networks,
            svm_networks,
            mut svm_rpc_urls,
        } = options;

        if evm_private_key.is_none() && svm_private_key.is_none() {
            return Err(ConfigurationError::MissingCredentials);
        }
        if evm_networks.is_empty() && svm_networks.is_empty() {
            return Err(ConfigurationError::MissingNetworks);
        }

        let mut credentials = HashMap::new();
        if let Some(key) = evm_private_key {
            credentials.insert(NetworkFamily::Evm, key);
        }
        if let Some(key) = svm_private_key {
            credentials.insert(NetworkFamily::Svm, key);
        }

        let mut registry = Self {
            descriptors: Vec::with_capacity(evm_networks.len() + svm_networks.len()),
            index: HashMap::new(),
            credentials,
            rpc_overrides: HashMap::new(),
        };
        for network in evm_networks {
            registry.insert(network, NetworkFamily::Evm);
        }
        for network in svm_networks {
            let url = svm_rpc_urls.remove(&network);
            if registry.insert(network.clone(), NetworkFamily::Svm)
                && let Some(url) = url
            {
                registry.rpc_overrides.insert(network, url);
            }
        }

        if !registry.descriptors.iter().any(|d| d.credential_present) {
            let networks = registry
                .descriptors
                .iter()
                .map(|d| d.canonical_name.clone())
                .collect();
            return Err(ConfigurationError::NoUsableNetwork(networks));
        }

        #[cfg(feature = "telemetry")]
        for descriptor in registry.descriptors.iter().filter(|d| !d.credential_present) {
            tracing::warn!(
                network = %descriptor.canonical_name,
                family = %descriptor.family,
                "Network configured without a credential for its family; it will not be served"
            );
        }

        Ok(registry)
    }

    /// Records `network` unless it is blank or already taken. Returns whether
    /// it was recorded.
    fn insert(&mut self, network: Network, family: NetworkFamily) -> bool {
        if network.is_empty() || self.index.contains_key(&network) {
            return false;
        }
        let credential_present = self.credentials.contains_key(&family);
        self.index.insert(network.clone(), self.descriptors.len());
        self.descriptors.push(NetworkDescriptor {
            canonical_name: network,
            family,
            credential_present,
        });
        true
    }

    /// Returns the family serving `network`, or `None` if the network is not
    /// configured or its family has no credential.
    #[must_use]
    pub fn is_supported(&self, network: &str) -> Option<NetworkFamily> {
        self.descriptor(network)
            .filter(|d| d.credential_present)
            .map(|d| d.family)
    }

    /// Returns the descriptor for `network`, whether usable or not.
    #[must_use]
    pub fn descriptor(&self, network: &str) -> Option<&NetworkDescriptor> {
        self.index.get(network).map(|&i| &self.descriptors[i])
    }

    /// All configured networks, EVM first, each family in configuration order.
    #[must_use]
    pub fn descriptors(&self) -> &[NetworkDescriptor] {
        &self.descriptors
    }

    /// RPC endpoint override for a configured SVM network.
    #[must_use]
    pub fn rpc_override(&self, network: &str) -> Option<&Url> {
        self.rpc_overrides.get(network)
    }

    /// Credential held for `family`.
    #[must_use]
    pub fn credential(&self, family: NetworkFamily) -> Option<&Credential> {
        self.credentials.get(&family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVM_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_requires_a_credential() {
        let options = FacilitatorOptions::default().with_evm_network("base-sepolia");
        assert!(matches!(
            NetworkRegistry::new(options),
            Err(ConfigurationError::MissingCredentials)
        ));
    }

    #[test]
    fn test_requires_a_network() {
        let options = FacilitatorOptions::default().with_evm_private_key(EVM_KEY);
        assert!(matches!(
            NetworkRegistry::new(options),
            Err(ConfigurationError::MissingNetworks)
        ));
    }

    #[test]
    fn test_requires_a_usable_network() {
        let options = FacilitatorOptions::default()
            .with_evm_private_key(EVM_KEY)
            .with_svm_network("solana-devnet");
        let err = NetworkRegistry::new(options).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no configured network has a credential for its family: solana-devnet"
        );
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let options = FacilitatorOptions::default()
            .with_evm_private_key("  ")
            .with_evm_network("base");
        assert!(matches!(
            NetworkRegistry::new(options),
            Err(ConfigurationError::MissingCredentials)
        ));
    }

    #[test]
    fn test_is_supported_only_for_configured_and_credentialed() {
        let options = FacilitatorOptions::default()
            .with_evm_private_key(EVM_KEY)
            .with_evm_network("base-sepolia")
            .with_svm_network("solana-devnet");
        let registry = NetworkRegistry::new(options).unwrap();

        assert_eq!(registry.is_supported("base-sepolia"), Some(NetworkFamily::Evm));
        assert_eq!(registry.is_supported("solana-devnet"), None);
        assert_eq!(registry.is_supported("base"), None);
        assert!(!registry.descriptor("solana-devnet").unwrap().credential_present);
    }

    #[test]
    fn test_duplicates_keep_first_family() {
        let options = FacilitatorOptions::default()
            .with_evm_private_key(EVM_KEY)
            .with_svm_private_key("svm-key")
            .with_evm_network("base")
            .with_evm_network("base")
            .with_svm_network("base");
        let registry = NetworkRegistry::new(options).unwrap();
        assert_eq!(registry.descriptors().len(), 1);
        assert_eq!(registry.is_supported("base"), Some(NetworkFamily::Evm));
    }

    #[test]
    fn test_rpc_override_only_for_svm_networks() {
        let url: Url = "https://devnet.example.com/rpc".parse().unwrap();
        let options = FacilitatorOptions::default()
            .with_svm_private_key("svm-key")
            .with_svm_network("solana-devnet")
            .with_svm_rpc_url("solana-devnet", url.clone())
            .with_svm_rpc_url("solana", "https://unused.example.com".parse().unwrap());
        let registry = NetworkRegistry::new(options).unwrap();
        assert_eq!(registry.rpc_override("solana-devnet"), Some(&url));
        assert_eq!(registry.rpc_override("solana"), None);
    }

    #[test]
    fn test_rpc_override_ignored_for_name_taken_by_evm() {
        let options = FacilitatorOptions::default()
            .with_evm_private_key(EVM_KEY)
            .with_svm_private_key("svm-key")
            .with_evm_network("base")
            .with_svm_network("base")
            .with_svm_rpc_url("base", "https://svm.example.com/rpc".parse().unwrap());
        let registry = NetworkRegistry::new(options).unwrap();
        assert_eq!(registry.is_supported("base"), Some(NetworkFamily::Evm));
        assert_eq!(registry.rpc_override("base"), None);
    }

    #[test]
    fn test_descriptor_order_is_evm_then_svm() {
        let options = FacilitatorOptions::default()
            .with_evm_private_key(EVM_KEY)
            .with_svm_private_key("svm-key")
            .with_svm_network("solana")
            .with_evm_network("base")
            .with_evm_network("base-sepolia");
        let registry = NetworkRegistry::new(options).unwrap();
        let names: Vec<_> = registry
            .descriptors()
            .iter()
            .map(|d| d.canonical_name.as_str())
            .collect();
        assert_eq!(names, ["base", "base-sepolia", "solana"]);
    }
}
