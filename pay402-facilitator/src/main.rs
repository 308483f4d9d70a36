//! x402 payment facilitator HTTP server.
//!
//! # Usage
//!
//! ```bash
//! EVM_PRIVATE_KEY=0x... ENGINE_URL=http://localhost:4000 \
//!     cargo run -p pay402-facilitator --release
//!
//! # Serve Solana devnet as well, with a private RPC endpoint
//! SVM_PRIVATE_KEY=... SUPPORTED_NETWORKS=base-sepolia,solana-devnet \
//!     SOLANA_DEVNET_RPC_URL=https://devnet.example.com \
//!     cargo run -p pay402-facilitator
//! ```
//!
//! See [`pay402_facilitator::config`] for every setting. `RUST_LOG` controls
//! the log filter (default: `info`).

use std::sync::Arc;

use pay402::Facilitator;
use pay402::chain::ChainDirectory;
use pay402_evm::EvmChains;
use pay402_svm::SvmChains;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pay402_facilitator::error::panic_response;
use pay402_facilitator::util::SigDown;
use pay402_facilitator::{Config, FacilitatorState, RemoteEngine, cors_layer, facilitator_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Facilitator failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    if rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider())
        .is_err()
    {
        tracing::debug!("A rustls crypto provider was already installed");
    }

    let config = Config::load();
    tracing::info!(
        addr = %config.socket_addr(),
        environment = %config.environment,
        "Loaded configuration"
    );

    let directory = ChainDirectory::new()
        .with_family(EvmChains::new())
        .with_family(SvmChains::new());
    let options = config.facilitator_options(&directory);

    let mut engine = RemoteEngine::try_new(config.engine_url.clone())?;
    if let Some(timeout) = config.engine_timeout() {
        engine = engine.with_timeout(timeout);
    }
    tracing::info!(engine = %engine.base_url(), "Forwarding execution to remote engine");

    let facilitator = Facilitator::new(options, directory, Arc::new(engine))?;
    for descriptor in facilitator.registry().descriptors() {
        tracing::info!(
            network = %descriptor.canonical_name,
            family = %descriptor.family,
            served = descriptor.credential_present,
            "Configured network"
        );
    }

    let environment = config.environment;
    let state = FacilitatorState::new(Arc::new(facilitator), environment);
    let app = facilitator_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(move |panic| {
            panic_response(panic, environment)
        }))
        .layer(cors_layer(environment, config.allowed_origins()));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Facilitator listening on http://{addr}");

    let sig_down = SigDown::try_new()?;
    let shutdown = sig_down.cancellation_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    sig_down.recv().await;

    tracing::info!("Facilitator shut down gracefully");
    Ok(())
}
