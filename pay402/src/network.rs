//! Network families, descriptors and credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::proto::Network;

/// A group of networks sharing one client/signer abstraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkFamily {
    /// Account-model EVM chains.
    Evm,
    /// Fee-payer-model Solana-style chains.
    Svm,
}

impl NetworkFamily {
    /// Lowercase name of the family.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Evm => "evm",
            Self::Svm => "svm",
        }
    }
}

impl fmt::Display for NetworkFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    /// Protocol-level network identifier, unique within a registry.
    pub canonical_name: Network,
    /// Family handling this network.
    pub family: NetworkFamily,
    /// Whether a credential for `family` is configured.
    pub credential_present: bool,
}

/// Private key material for one family.
///
/// The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a secret. Surrounding whitespace is discarded.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into().trim().to_owned())
    }

    /// Wraps a secret, returning `None` when it is blank.
    #[must_use]
    pub fn non_empty(secret: impl Into<String>) -> Option<Self> {
        Some(Self::new(secret)).filter(|c| !c.0.is_empty())
    }

    /// Exposes the secret to a signer constructor.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("0xsecret");
        assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
        assert_eq!(credential.expose(), "0xsecret");
    }

    #[test]
    fn test_blank_credential_is_none() {
        assert!(Credential::non_empty("   ").is_none());
        assert_eq!(
            Credential::non_empty(" key ").map(|c| c.expose().to_owned()),
            Some("key".to_owned())
        );
    }

    #[test]
    fn test_family_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&NetworkFamily::Svm).unwrap(), "\"svm\"");
        assert_eq!(NetworkFamily::Evm.to_string(), "evm");
    }
}
