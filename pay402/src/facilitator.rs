//! The facilitator dispatch engine.
//!
//! [`Facilitator`] validates envelopes, routes them to the chain family that
//! serves the required network, and hands the resulting client or signer to
//! the [`PaymentEngine`]. It also announces which payment kinds it can serve.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::chain::{ChainDirectory, ChainError, ChainFamily, ExecutionConfig};
use crate::engine::PaymentEngine;
use crate::envelope;
use crate::error::{ConfigurationError, FacilitatorError};
use crate::network::{Credential, NetworkDescriptor, NetworkFamily};
use crate::proto::{SettleResult, SupportedKind, SupportedResponse, VerifyResult};
use crate::registry::{FacilitatorOptions, NetworkRegistry};

/// Routes verify and settle requests across network families.
///
/// Immutable after construction and safe to share behind an [`Arc`].
/// Clients and signers are built per call and never cached.
pub struct Facilitator {
    registry: NetworkRegistry,
    directory: ChainDirectory,
    engine: Arc<dyn PaymentEngine>,
}

impl fmt::Debug for Facilitator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facilitator")
            .field("registry", &self.registry)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

impl Facilitator {
    /// Builds a facilitator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the options name no credential, no
    /// network, or no network usable with the given credentials.
    pub fn new(
        options: FacilitatorOptions,
        directory: ChainDirectory,
        engine: Arc<dyn PaymentEngine>,
    ) -> Result<Self, ConfigurationError> {
        let registry = NetworkRegistry::new(options)?;
        Ok(Self {
            registry,
            directory,
            engine,
        })
    }

    /// The network registry.
    #[must_use]
    pub const fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    /// Lists the payment kinds this facilitator can serve.
    ///
    /// A network whose family cannot derive its extra data (for SVM, the fee
    /// payer address) is left out with a warning. This never fails.
    pub async fn list_supported_kinds(&self) -> SupportedResponse {
        let mut kinds = Vec::new();
        for descriptor in self.registry.descriptors() {
            if !descriptor.credential_present {
                continue;
            }
            match self.supported_extra(descriptor).await {
                Ok(extra) => kinds.push(SupportedKind::exact(&descriptor.canonical_name, extra)),
                #[cfg(feature = "telemetry")]
                Err(err) => tracing::warn!(
                    network = %descriptor.canonical_name,
                    family = %descriptor.family,
                    error = %err,
                    "Skipping network in supported kinds"
                ),
                #[cfg(not(feature = "telemetry"))]
                Err(_) => {}
            }
        }
        SupportedResponse { kinds }
    }

    async fn supported_extra(
        &self,
        descriptor: &NetworkDescriptor,
    ) -> Result<Option<Value>, ChainError> {
        let network = descriptor.canonical_name.as_str();
        let (family, credential) = self.resolve(descriptor.family)?;
        let config = self.execution_config(network);
        family
            .supported_extra(network, credential, config.as_ref())
            .await
    }

    /// Verifies a payment.
    ///
    /// A network this facilitator does not serve yields `isValid: false`
    /// without contacting the engine.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorError::Schema`] for a malformed envelope, and
    /// [`FacilitatorError::Chain`] or [`FacilitatorError::Engine`] if the
    /// verification could not be carried out.
    pub async fn verify_payment(
        &self,
        payload: &Value,
        requirements: &Value,
    ) -> Result<VerifyResult, FacilitatorError> {
        let (payload, requirements) = envelope::validate(payload, requirements)?;
        let network = requirements.network.as_str();
        let Some(kind) = self.registry.is_supported(network) else {
            #[cfg(feature = "telemetry")]
            tracing::debug!(network, "Verify requested for unsupported network");
            return Ok(VerifyResult::invalid());
        };
        #[cfg(feature = "telemetry")]
        warn_on_network_mismatch(&payload, &requirements);

        let (family, credential) = self.resolve(kind)?;
        let config = self.execution_config(network);
        let handle = family
            .verify_handle(network, credential, config.as_ref())
            .await?;
        let result = self
            .engine
            .verify(&handle, &payload, &requirements, config.as_ref())
            .await?;

        #[cfg(feature = "telemetry")]
        tracing::info!(network, family = %kind, is_valid = result.is_valid, "Payment verified");
        Ok(result)
    }

    /// Settles a payment.
    ///
    /// A network this facilitator does not serve yields a failed settlement
    /// with an empty transaction, without contacting the engine.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorError::Schema`] for a malformed envelope, and
    /// [`FacilitatorError::Chain`] or [`FacilitatorError::Engine`] if the
    /// settlement could not be carried out.
    pub async fn settle_payment(
        &self,
        payload: &Value,
        requirements: &Value,
    ) -> Result<SettleResult, FacilitatorError> {
        let (payload, requirements) = envelope::validate(payload, requirements)?;
        let network = requirements.network.as_str();
        let Some(kind) = self.registry.is_supported(network) else {
            #[cfg(feature = "telemetry")]
            tracing::debug!(network, "Settle requested for unsupported network");
            return Ok(SettleResult::unsupported_network(network));
        };
        #[cfg(feature = "telemetry")]
        warn_on_network_mismatch(&payload, &requirements);

        let (family, credential) = self.resolve(kind)?;
        let config = self.execution_config(network);
        let signer = family
            .build_signer(network, credential, config.as_ref())
            .await?;
        let result = self
            .engine
            .settle(signer.as_ref(), &payload, &requirements, config.as_ref())
            .await?;

        #[cfg(feature = "telemetry")]
        tracing::info!(
            network,
            family = %kind,
            success = result.success,
            transaction = %result.transaction,
            "Payment settled"
        );
        Ok(result)
    }

    fn resolve(
        &self,
        kind: NetworkFamily,
    ) -> Result<(&dyn ChainFamily, &Credential), ChainError> {
        let family = self
            .directory
            .family(kind)
            .ok_or(ChainError::UnsupportedFamily(kind))?;
        let credential = self
            .registry
            .credential(kind)
            .ok_or(ChainError::MissingCredential(kind))?;
        Ok((family.as_ref(), credential))
    }

    fn execution_config(&self, network: &str) -> Option<ExecutionConfig> {
        self.registry
            .rpc_override(network)
            .cloned()
            .map(ExecutionConfig::with_rpc_url)
    }
}

/// Routing follows the requirements. A payload signed for another network is
/// passed through and left for the engine to reject.
#[cfg(feature = "telemetry")]
fn warn_on_network_mismatch(
    payload: &crate::proto::PaymentPayload,
    requirements: &crate::proto::PaymentRequirements,
) {
    if payload.network != requirements.network {
        tracing::warn!(
            payload_network = %payload.network,
            requirements_network = %requirements.network,
            "Payment payload and requirements name different networks"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::chain::{ChainHandle, ReadClient, Signer};
    use crate::engine::EngineError;
    use crate::envelope::tests::{payload_json, requirements_json};
    use crate::proto::{PaymentPayload, PaymentRequirements};

    const EVM_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const SVM_KEY: &str = "svm-secret";
    const FEE_PAYER: &str = "FeePayer1111111111111111111111111111111111";

    #[derive(Debug)]
    struct StubClient(String);

    impl ReadClient for StubClient {
        fn network(&self) -> &str {
            &self.0
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct StubSigner {
        network: String,
        address: Option<String>,
    }

    impl Signer for StubSigner {
        fn network(&self) -> &str {
            &self.network
        }

        fn address(&self) -> Option<String> {
            self.address.clone()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct StubFamily {
        kind: NetworkFamily,
        known: &'static [&'static str],
        broken: &'static [&'static str],
        anonymous: &'static [&'static str],
        builds: Arc<AtomicUsize>,
    }

    impl StubFamily {
        fn new(kind: NetworkFamily, known: &'static [&'static str]) -> Self {
            Self {
                kind,
                known,
                broken: &[],
                anonymous: &[],
                builds: Arc::default(),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChainFamily for StubFamily {
        fn family(&self) -> NetworkFamily {
            self.kind
        }

        fn is_known_network(&self, network: &str) -> bool {
            self.known.contains(&network)
        }

        async fn build_read_client(
            &self,
            network: &str,
        ) -> Result<Arc<dyn ReadClient>, ChainError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubClient(network.to_owned())))
        }

        async fn build_signer(
            &self,
            network: &str,
            credential: &Credential,
            _config: Option<&ExecutionConfig>,
        ) -> Result<Arc<dyn Signer>, ChainError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if self.broken.contains(&network) {
                return Err(ChainError::InvalidCredential {
                    family: self.kind,
                    network: network.to_owned(),
                    reason: "bad key".to_owned(),
                });
            }
            let address = match self.kind {
                _ if self.anonymous.contains(&network) => None,
                NetworkFamily::Evm => Some(format!("0x{}", credential.expose().len())),
                NetworkFamily::Svm => Some(FEE_PAYER.to_owned()),
            };
            Ok(Arc::new(StubSigner {
                network: network.to_owned(),
                address,
            }))
        }

        async fn verify_handle(
            &self,
            network: &str,
            credential: &Credential,
            config: Option<&ExecutionConfig>,
        ) -> Result<ChainHandle, ChainError> {
            match self.kind {
                NetworkFamily::Evm => {
                    Ok(ChainHandle::Client(self.build_read_client(network).await?))
                }
                NetworkFamily::Svm => Ok(ChainHandle::Signer(
                    self.build_signer(network, credential, config).await?,
                )),
            }
        }

        async fn supported_extra(
            &self,
            network: &str,
            credential: &Credential,
            config: Option<&ExecutionConfig>,
        ) -> Result<Option<Value>, ChainError> {
            if self.kind == NetworkFamily::Evm {
                return Ok(None);
            }
            let signer = self.build_signer(network, credential, config).await?;
            let fee_payer = signer
                .address()
                .ok_or_else(|| ChainError::NoSignerAddress(network.to_owned()))?;
            Ok(Some(json!({ "feePayer": fee_payer })))
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Client(String),
        Signer(String),
    }

    #[derive(Default)]
    struct StubEngine {
        verify_calls: AtomicUsize,
        settle_calls: AtomicUsize,
        reject: bool,
        seen: Mutex<Vec<(Seen, Option<ExecutionConfig>)>>,
    }

    #[async_trait::async_trait]
    impl PaymentEngine for StubEngine {
        async fn verify(
            &self,
            handle: &ChainHandle,
            payload: &PaymentPayload,
            _requirements: &PaymentRequirements,
            config: Option<&ExecutionConfig>,
        ) -> Result<VerifyResult, EngineError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            let seen = match handle {
                ChainHandle::Client(c) => Seen::Client(c.network().to_owned()),
                ChainHandle::Signer(s) => Seen::Signer(s.network().to_owned()),
            };
            self.seen.lock().unwrap().push((seen, config.cloned()));
            if self.reject {
                return Err(EngineError::Rejected("invalid signature".into()));
            }
            let payer = payload.payload["authorization"]["from"].as_str().map(str::to_owned);
            Ok(VerifyResult {
                is_valid: true,
                payer,
            })
        }

        async fn settle(
            &self,
            signer: &dyn Signer,
            _payload: &PaymentPayload,
            requirements: &PaymentRequirements,
            config: Option<&ExecutionConfig>,
        ) -> Result<SettleResult, EngineError> {
            self.settle_calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((Seen::Signer(signer.network().to_owned()), config.cloned()));
            if self.reject {
                return Err(EngineError::Rejected("insufficient funds".into()));
            }
            Ok(SettleResult {
                success: true,
                error_reason: None,
                transaction: "0xabc123".to_owned(),
                network: requirements.network.clone(),
                payer: signer.address(),
            })
        }
    }

    fn directory(evm: StubFamily, svm: StubFamily) -> ChainDirectory {
        ChainDirectory::new().with_family(evm).with_family(svm)
    }

    fn evm_only(engine: Arc<StubEngine>) -> Facilitator {
        let options = FacilitatorOptions::default()
            .with_evm_private_key(EVM_KEY)
            .with_evm_network("base-sepolia");
        Facilitator::new(
            options,
            directory(
                StubFamily::new(NetworkFamily::Evm, &["base", "base-sepolia"]),
                StubFamily::new(NetworkFamily::Svm, &["solana", "solana-devnet"]),
            ),
            engine,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_unsupported_network_never_reaches_engine() {
        let engine = Arc::new(StubEngine::default());
        let facilitator = evm_only(engine.clone());

        let verify = facilitator
            .verify_payment(&payload_json("unknown-chain"), &requirements_json("unknown-chain"))
            .await
            .unwrap();
        assert_eq!(verify, VerifyResult::invalid());

        let settle = facilitator
            .settle_payment(&payload_json("solana-devnet"), &requirements_json("solana-devnet"))
            .await
            .unwrap();
        assert_eq!(settle, SettleResult::unsupported_network("solana-devnet"));

        assert_eq!(engine.verify_calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.settle_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_evm_verify_uses_read_client_without_config() {
        let engine = Arc::new(StubEngine::default());
        let facilitator = evm_only(engine.clone());

        let result = facilitator
            .verify_payment(&payload_json("base-sepolia"), &requirements_json("base-sepolia"))
            .await
            .unwrap();
        assert!(result.is_valid);
        assert_eq!(
            result.payer.as_deref(),
            Some("0x857b06519E91e3A54538791bDbb0E22373e36b66")
        );
        assert_eq!(
            *engine.seen.lock().unwrap(),
            vec![(Seen::Client("base-sepolia".into()), None)]
        );
    }

    #[tokio::test]
    async fn test_evm_network_ignores_svm_override_for_same_name() {
        let engine = Arc::new(StubEngine::default());
        let facilitator = Facilitator::new(
            FacilitatorOptions::default()
                .with_evm_private_key(EVM_KEY)
                .with_svm_private_key(SVM_KEY)
                .with_evm_network("base-sepolia")
                .with_svm_network("base-sepolia")
                .with_svm_rpc_url("base-sepolia", "https://svm.example.com/".parse().unwrap()),
            directory(
                StubFamily::new(NetworkFamily::Evm, &["base-sepolia"]),
                StubFamily::new(NetworkFamily::Svm, &["base-sepolia"]),
            ),
            engine.clone(),
        )
        .unwrap();

        facilitator
            .verify_payment(&payload_json("base-sepolia"), &requirements_json("base-sepolia"))
            .await
            .unwrap();
        assert_eq!(
            *engine.seen.lock().unwrap(),
            vec![(Seen::Client("base-sepolia".into()), None)]
        );
    }

    #[tokio::test]
    async fn test_evm_settle_uses_signer() {
        let engine = Arc::new(StubEngine::default());
        let facilitator = evm_only(engine.clone());

        let result = facilitator
            .settle_payment(&payload_json("base-sepolia"), &requirements_json("base-sepolia"))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.transaction, "0xabc123");
        assert_eq!(result.network, "base-sepolia");
        assert_eq!(
            *engine.seen.lock().unwrap(),
            vec![(Seen::Signer("base-sepolia".into()), None)]
        );
    }

    #[tokio::test]
    async fn test_schema_violation_short_circuits() {
        let engine = Arc::new(StubEngine::default());
        let evm = StubFamily::new(NetworkFamily::Evm, &["base-sepolia"]);
        let builds = evm.builds.clone();
        let facilitator = Facilitator::new(
            FacilitatorOptions::default()
                .with_evm_private_key(EVM_KEY)
                .with_evm_network("base-sepolia"),
            directory(evm, StubFamily::new(NetworkFamily::Svm, &[])),
            engine.clone(),
        )
        .unwrap();

        let mut requirements = requirements_json("base-sepolia");
        requirements.as_object_mut().unwrap().remove("payTo");
        let err = facilitator
            .verify_payment(&payload_json("base-sepolia"), &requirements)
            .await
            .unwrap_err();

        let violation = err.as_schema_violation().unwrap();
        assert_eq!(violation.issues[0].path, ["paymentRequirements", "payTo"]);
        assert_eq!(builds.load(Ordering::SeqCst), 0);
        assert_eq!(engine.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeated_verify_is_idempotent() {
        let engine = Arc::new(StubEngine::default());
        let facilitator = evm_only(engine);
        let payload = payload_json("base-sepolia");
        let requirements = requirements_json("base-sepolia");

        let first = facilitator.verify_payment(&payload, &requirements).await.unwrap();
        let second = facilitator.verify_payment(&payload, &requirements).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_engine_failure_is_execution_error() {
        let engine = Arc::new(StubEngine {
            reject: true,
            ..StubEngine::default()
        });
        let facilitator = evm_only(engine);

        let err = facilitator
            .settle_payment(&payload_json("base-sepolia"), &requirements_json("base-sepolia"))
            .await
            .unwrap_err();
        assert!(matches!(err, FacilitatorError::Engine(EngineError::Rejected(_))));
        assert_eq!(err.to_string(), "insufficient funds");
    }

    #[tokio::test]
    async fn test_svm_routes_signer_with_rpc_override() {
        let engine = Arc::new(StubEngine::default());
        let url: url::Url = "https://devnet.example.com/rpc".parse().unwrap();
        let facilitator = Facilitator::new(
            FacilitatorOptions::default()
                .with_svm_private_key(SVM_KEY)
                .with_svm_network("solana-devnet")
                .with_svm_rpc_url("solana-devnet", url.clone()),
            directory(
                StubFamily::new(NetworkFamily::Evm, &[]),
                StubFamily::new(NetworkFamily::Svm, &["solana-devnet"]),
            ),
            engine.clone(),
        )
        .unwrap();

        facilitator
            .verify_payment(&payload_json("solana-devnet"), &requirements_json("solana-devnet"))
            .await
            .unwrap();
        let settle = facilitator
            .settle_payment(&payload_json("solana-devnet"), &requirements_json("solana-devnet"))
            .await
            .unwrap();
        assert_eq!(settle.payer.as_deref(), Some(FEE_PAYER));

        let expected = Some(ExecutionConfig::with_rpc_url(url));
        assert_eq!(
            *engine.seen.lock().unwrap(),
            vec![
                (Seen::Signer("solana-devnet".into()), expected.clone()),
                (Seen::Signer("solana-devnet".into()), expected),
            ]
        );
    }

    #[tokio::test]
    async fn test_supported_kinds_skip_only_failing_svm_network() {
        let svm = StubFamily {
            broken: &["solana"],
            ..StubFamily::new(NetworkFamily::Svm, &["solana", "solana-devnet"])
        };
        let facilitator = Facilitator::new(
            FacilitatorOptions::default()
                .with_evm_private_key(EVM_KEY)
                .with_svm_private_key(SVM_KEY)
                .with_evm_network("base-sepolia")
                .with_svm_network("solana")
                .with_svm_network("solana-devnet"),
            directory(StubFamily::new(NetworkFamily::Evm, &["base-sepolia"]), svm),
            Arc::new(StubEngine::default()),
        )
        .unwrap();

        let supported = facilitator.list_supported_kinds().await;
        assert_eq!(
            serde_json::to_value(supported).unwrap(),
            json!({
                "kinds": [
                    { "x402Version": 1, "scheme": "exact", "network": "base-sepolia" },
                    {
                        "x402Version": 1,
                        "scheme": "exact",
                        "network": "solana-devnet",
                        "extra": { "feePayer": FEE_PAYER }
                    }
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_supported_kinds_skip_svm_signer_without_address() {
        let svm = StubFamily {
            anonymous: &["solana-devnet"],
            ..StubFamily::new(NetworkFamily::Svm, &["solana", "solana-devnet"])
        };
        let facilitator = Facilitator::new(
            FacilitatorOptions::default()
                .with_evm_private_key(EVM_KEY)
                .with_svm_private_key(SVM_KEY)
                .with_evm_network("base-sepolia")
                .with_svm_network("solana-devnet")
                .with_svm_network("solana"),
            directory(StubFamily::new(NetworkFamily::Evm, &["base-sepolia"]), svm),
            Arc::new(StubEngine::default()),
        )
        .unwrap();

        let kinds = facilitator.list_supported_kinds().await.kinds;
        let networks: Vec<_> = kinds.iter().map(|k| k.network.as_str()).collect();
        assert_eq!(networks, ["base-sepolia", "solana"]);
        assert_eq!(kinds[1].extra, Some(json!({ "feePayer": FEE_PAYER })));
    }

    #[tokio::test]
    async fn test_supported_kinds_omit_networks_without_credential() {
        let facilitator = Facilitator::new(
            FacilitatorOptions::default()
                .with_evm_private_key(EVM_KEY)
                .with_evm_network("base-sepolia")
                .with_svm_network("solana-devnet"),
            directory(
                StubFamily::new(NetworkFamily::Evm, &["base-sepolia"]),
                StubFamily::new(NetworkFamily::Svm, &["solana-devnet"]),
            ),
            Arc::new(StubEngine::default()),
        )
        .unwrap();

        let networks: Vec<_> = facilitator
            .list_supported_kinds()
            .await
            .kinds
            .into_iter()
            .map(|k| k.network)
            .collect();
        assert_eq!(networks, ["base-sepolia"]);
    }
}
