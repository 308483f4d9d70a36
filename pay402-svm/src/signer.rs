//! Keypair-backed fee payer for Solana networks.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use pay402::chain::Signer;
use solana_keypair::Keypair;
use solana_signer::Signer as _;
use url::Url;

/// Reason a private key string could not be turned into a [`Keypair`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct KeypairParseError(String);

/// Parses a 64-byte keypair given either as base58 or as a JSON byte array
/// (the format written by `solana-keygen`).
///
/// # Errors
///
/// Returns [`KeypairParseError`] if the string is neither, or the bytes are
/// not a valid ed25519 keypair.
pub fn parse_keypair(secret: &str) -> Result<Keypair, KeypairParseError> {
    let secret = secret.trim();
    let bytes = if secret.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(secret)
            .map_err(|e| KeypairParseError(format!("invalid JSON byte array: {e}")))?
    } else {
        bs58::decode(secret)
            .into_vec()
            .map_err(|e| KeypairParseError(format!("invalid base58: {e}")))?
    };
    Keypair::try_from(bytes.as_slice()).map_err(|e| KeypairParseError(e.to_string()))
}

/// The facilitator's fee payer on one Solana network.
#[derive(Clone)]
pub struct SvmSigner {
    network: String,
    keypair: Arc<Keypair>,
    rpc_url: Url,
}

impl SvmSigner {
    /// Binds `keypair` to `network`, reached through `rpc_url`.
    #[must_use]
    pub fn new(network: impl Into<String>, keypair: Keypair, rpc_url: Url) -> Self {
        Self {
            network: network.into(),
            keypair: Arc::new(keypair),
            rpc_url,
        }
    }

    /// The fee payer keypair.
    #[must_use]
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Endpoint transactions are submitted to.
    #[must_use]
    pub const fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }
}

impl fmt::Debug for SvmSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvmSigner")
            .field("network", &self.network)
            .field("pubkey", &self.keypair.pubkey())
            .field("rpc_url", &self.rpc_url.as_str())
            .finish()
    }
}

impl Signer for SvmSigner {
    fn network(&self) -> &str {
        &self.network
    }

    fn address(&self) -> Option<String> {
        Some(self.keypair.pubkey().to_string())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_base58_keypair() {
        let keypair = Keypair::new();
        let parsed = parse_keypair(&keypair.to_base58_string()).unwrap();
        assert_eq!(parsed.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_parses_json_byte_array() {
        let keypair = Keypair::new();
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        let parsed = parse_keypair(&json).unwrap();
        assert_eq!(parsed.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_keypair("0OIl").is_err());
        assert!(parse_keypair("[1, 2, 3]").is_err());
        assert!(parse_keypair("").is_err());
    }

    #[test]
    fn test_debug_shows_pubkey_only() {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey().to_string();
        let secret = keypair.to_base58_string();
        let rpc_url = "https://api.devnet.solana.com".parse().unwrap();
        let signer = SvmSigner::new("solana-devnet", keypair, rpc_url);
        let debug = format!("{signer:?}");
        assert!(debug.contains(&pubkey));
        assert!(!debug.contains(&secret));
    }
}
