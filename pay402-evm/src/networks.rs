//! Known EVM networks, their chain ids and public RPC endpoints.

/// Static metadata of one EVM network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvmNetwork {
    /// x402 network name.
    pub name: &'static str,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Public HTTP RPC endpoint used when no override is given.
    pub rpc_url: &'static str,
}

/// Base Mainnet.
pub const BASE: EvmNetwork = EvmNetwork {
    name: "base",
    chain_id: 8453,
    rpc_url: "https://mainnet.base.org",
};

/// Base Sepolia (testnet).
pub const BASE_SEPOLIA: EvmNetwork = EvmNetwork {
    name: "base-sepolia",
    chain_id: 84532,
    rpc_url: "https://sepolia.base.org",
};

/// Avalanche C-Chain.
pub const AVALANCHE: EvmNetwork = EvmNetwork {
    name: "avalanche",
    chain_id: 43114,
    rpc_url: "https://api.avax.network/ext/bc/C/rpc",
};

/// Avalanche Fuji (testnet).
pub const AVALANCHE_FUJI: EvmNetwork = EvmNetwork {
    name: "avalanche-fuji",
    chain_id: 43113,
    rpc_url: "https://api.avax-test.network/ext/bc/C/rpc",
};

/// Polygon Mainnet.
pub const POLYGON: EvmNetwork = EvmNetwork {
    name: "polygon",
    chain_id: 137,
    rpc_url: "https://polygon-rpc.com",
};

/// Polygon Amoy (testnet).
pub const POLYGON_AMOY: EvmNetwork = EvmNetwork {
    name: "polygon-amoy",
    chain_id: 80002,
    rpc_url: "https://rpc-amoy.polygon.technology",
};

/// Every EVM network this family can serve.
pub static EVM_NETWORKS: &[EvmNetwork] = &[
    BASE,
    BASE_SEPOLIA,
    AVALANCHE,
    AVALANCHE_FUJI,
    POLYGON,
    POLYGON_AMOY,
];

/// Looks up a network by its x402 name.
#[must_use]
pub fn evm_network(name: &str) -> Option<&'static EvmNetwork> {
    EVM_NETWORKS.iter().find(|n| n.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(evm_network("base-sepolia").map(|n| n.chain_id), Some(84532));
        assert!(evm_network("solana").is_none());
    }

    #[test]
    fn test_default_rpc_urls_parse() {
        for network in EVM_NETWORKS {
            assert!(url::Url::parse(network.rpc_url).is_ok(), "{}", network.name);
        }
    }
}
