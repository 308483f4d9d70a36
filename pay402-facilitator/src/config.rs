//! Facilitator server configuration.
//!
//! Every setting is a CLI flag with an environment variable fallback. A
//! `.env` file in the working directory is loaded first.
//!
//! # Environment Variables
//!
//! - `EVM_PRIVATE_KEY` - Hex private key used for every EVM network
//! - `SVM_PRIVATE_KEY` - Base58 (or JSON byte array) keypair used for every Solana network
//! - `SUPPORTED_NETWORKS` - Comma-separated network names (default: `base-sepolia`)
//! - `SOLANA_RPC_URL` - RPC endpoint override for `solana`
//! - `SOLANA_DEVNET_RPC_URL` - RPC endpoint override for `solana-devnet`
//! - `ENGINE_URL` - Base URL of the payment execution service
//! - `ENGINE_TIMEOUT_SECS` - Per-request timeout for the execution service
//! - `HOST` - Bind address (default: `0.0.0.0`)
//! - `PORT` - Port (default: `3002`)
//! - `NODE_ENV` - `development`, `production` or `test` (default: `development`)
//! - `ALLOWED_ORIGINS` - Comma-separated CORS origins, enforced in production

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use pay402::FacilitatorOptions;
use pay402::chain::ChainDirectory;
use pay402::network::{Credential, NetworkFamily};
use serde::Serialize;
use url::Url;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development. Internal error messages are exposed.
    #[default]
    Development,
    /// Production. CORS is restricted to `ALLOWED_ORIGINS`.
    Production,
    /// Automated tests.
    Test,
}

impl Environment {
    /// Lowercase name, as accepted in `NODE_ENV`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CLI arguments and environment of the facilitator server.
#[derive(Parser, Clone)]
#[command(name = "pay402-facilitator")]
#[command(about = "x402 payment facilitator HTTP server", version)]
pub struct Config {
    /// Private key for EVM networks
    #[arg(long, env = "EVM_PRIVATE_KEY", hide_env_values = true)]
    pub evm_private_key: Option<String>,

    /// Private key for Solana networks
    #[arg(long, env = "SVM_PRIVATE_KEY", hide_env_values = true)]
    pub svm_private_key: Option<String>,

    /// Networks to serve
    #[arg(
        long,
        env = "SUPPORTED_NETWORKS",
        value_delimiter = ',',
        default_value = "base-sepolia"
    )]
    pub supported_networks: Vec<String>,

    /// RPC endpoint for Solana mainnet
    #[arg(long, env = "SOLANA_RPC_URL")]
    pub solana_rpc_url: Option<Url>,

    /// RPC endpoint for Solana devnet
    #[arg(long, env = "SOLANA_DEVNET_RPC_URL")]
    pub solana_devnet_rpc_url: Option<Url>,

    /// Base URL of the payment execution service
    #[arg(long, env = "ENGINE_URL")]
    pub engine_url: Url,

    /// Timeout in seconds for execution service requests
    #[arg(long, env = "ENGINE_TIMEOUT_SECS")]
    pub engine_timeout_secs: Option<u64>,

    /// Bind address
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port
    #[arg(long, env = "PORT", default_value_t = 3002)]
    pub port: u16,

    /// Deployment environment
    #[arg(long, env = "NODE_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    /// Origins allowed by CORS in production
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("evm_private_key", &self.evm_private_key.as_ref().map(|_| "<redacted>"))
            .field("svm_private_key", &self.svm_private_key.as_ref().map(|_| "<redacted>"))
            .field("supported_networks", &self.supported_networks)
            .field("solana_rpc_url", &self.solana_rpc_url)
            .field("solana_devnet_rpc_url", &self.solana_devnet_rpc_url)
            .field("engine_url", &self.engine_url)
            .field("engine_timeout_secs", &self.engine_timeout_secs)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl Config {
    /// Loads `.env`, then parses CLI arguments and environment variables.
    ///
    /// Exits the process with a usage message if they are invalid.
    #[must_use]
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    /// Address to bind the HTTP server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Timeout for execution service requests, if any.
    #[must_use]
    pub fn engine_timeout(&self) -> Option<Duration> {
        self.engine_timeout_secs.map(Duration::from_secs)
    }

    /// Configured CORS origins, without blanks.
    pub fn allowed_origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .iter()
            .map(|o| o.as_str().trim())
            .filter(|o| !o.is_empty())
    }

    /// Splits the configured networks into families and collects the
    /// credentials and RPC overrides for the dispatch core.
    ///
    /// Names no family in `directory` knows are skipped with a warning.
    #[must_use]
    pub fn facilitator_options(&self, directory: &ChainDirectory) -> FacilitatorOptions {
        let mut options = FacilitatorOptions {
            evm_private_key: self.evm_private_key.clone().and_then(Credential::non_empty),
            svm_private_key: self.svm_private_key.clone().and_then(Credential::non_empty),
            ..FacilitatorOptions::default()
        };

        for network in self.supported_networks.iter().map(|n| n.as_str().trim()) {
            if network.is_empty() {
                continue;
            }
            match directory.family_of(network) {
                Some(NetworkFamily::Evm) => options.evm_networks.push(network.to_owned()),
                Some(NetworkFamily::Svm) => options.svm_networks.push(network.to_owned()),
                None => tracing::warn!(network, "Skipping unknown network"),
            }
        }

        let overrides = [
            (pay402_svm::networks::SOLANA.name, &self.solana_rpc_url),
            (pay402_svm::networks::SOLANA_DEVNET.name, &self.solana_devnet_rpc_url),
        ];
        for (network, url) in overrides {
            if let Some(url) = url {
                options.svm_rpc_urls.insert(network.to_owned(), url.clone());
            }
        }

        options
    }
}
