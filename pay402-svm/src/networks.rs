//! Known Solana networks.

/// Static metadata of one Solana cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvmNetwork {
    /// x402 network name.
    pub name: &'static str,
    /// Public HTTP RPC endpoint used when no override is given.
    pub rpc_url: &'static str,
}

/// Solana mainnet-beta.
pub const SOLANA: SvmNetwork = SvmNetwork {
    name: "solana",
    rpc_url: "https://api.mainnet-beta.solana.com",
};

/// Solana devnet.
pub const SOLANA_DEVNET: SvmNetwork = SvmNetwork {
    name: "solana-devnet",
    rpc_url: "https://api.devnet.solana.com",
};

/// Every Solana network this family can serve.
pub static SVM_NETWORKS: &[SvmNetwork] = &[SOLANA, SOLANA_DEVNET];

/// Looks up a network by its x402 name.
#[must_use]
pub fn svm_network(name: &str) -> Option<&'static SvmNetwork> {
    SVM_NETWORKS.iter().find(|n| n.name == name)
}
