//! Wire format types for the x402 facilitator API.
//!
//! These are the V1 shapes exchanged on `/verify`, `/settle` and `/supported`.
//! All types serialize with camelCase field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version advertised for every supported kind.
pub const X402_VERSION: u32 = 1;

/// The only payment scheme this facilitator advertises.
pub const EXACT_SCHEME: &str = "exact";

/// `errorReason` reported when settlement targets an unsupported network.
pub const UNSUPPORTED_NETWORK_REASON: &str = "Network not supported by this facilitator";

/// Canonical network identifier (e.g. `"base-sepolia"`, `"solana-devnet"`).
pub type Network = String;

/// A client's payment proof.
///
/// `payload` is opaque to the facilitator and handed to the execution engine
/// unmodified.
///
/// # JSON Format
///
/// ```json
/// {
///   "x402Version": 1,
///   "scheme": "exact",
///   "network": "base-sepolia",
///   "payload": { "signature": "0x...", "authorization": { } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Protocol version of the payload.
    pub x402_version: u32,

    /// Payment scheme identifier.
    pub scheme: String,

    /// Network the client signed for.
    pub network: Network,

    /// Scheme-specific proof data.
    pub payload: Value,
}

/// What a resource server demands for a protected resource.
///
/// # JSON Format
///
/// ```json
/// {
///   "scheme": "exact",
///   "network": "base-sepolia",
///   "maxAmountRequired": "1000000",
///   "resource": "https://api.example.com/data",
///   "description": "Premium data",
///   "mimeType": "application/json",
///   "payTo": "0x...",
///   "maxTimeoutSeconds": 300,
///   "asset": "0x..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Payment scheme identifier.
    pub scheme: String,

    /// Network that must carry the payment. Drives routing.
    pub network: Network,

    /// Maximum amount in the asset's smallest unit, as a decimal string.
    pub max_amount_required: String,

    /// Resource being paid for.
    pub resource: String,

    /// Human-readable description of the resource.
    pub description: String,

    /// MIME type of the resource.
    pub mime_type: String,

    /// Recipient address.
    pub pay_to: String,

    /// Maximum time in seconds for payment validity.
    pub max_timeout_seconds: u64,

    /// Asset address or identifier.
    pub asset: String,

    /// Optional response schema of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,

    /// Additional scheme-specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// Body of `POST /verify` and `POST /settle`.
///
/// Both halves stay untyped until the envelope validator has looked at them,
/// so that a missing half surfaces as a field-level issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeRequest {
    /// Raw payment payload.
    #[serde(default)]
    pub payment_payload: Value,

    /// Raw payment requirements.
    #[serde(default)]
    pub payment_requirements: Value,
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    /// Whether the payment is valid.
    pub is_valid: bool,

    /// The payer's address, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl VerifyResult {
    /// A negative result with no payer.
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            is_valid: false,
            payer: None,
        }
    }
}

/// Outcome of a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResult {
    /// Whether settlement succeeded.
    pub success: bool,

    /// Reason for failure, when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,

    /// Transaction identifier. Empty when nothing was settled.
    pub transaction: String,

    /// Network the settlement was attempted on.
    pub network: Network,

    /// The payer's address, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl SettleResult {
    /// The no-op result for a network this facilitator does not serve.
    #[must_use]
    pub fn unsupported_network(network: impl Into<Network>) -> Self {
        Self {
            success: false,
            error_reason: Some(UNSUPPORTED_NETWORK_REASON.to_owned()),
            transaction: String::new(),
            network: network.into(),
            payer: None,
        }
    }
}

/// One advertised `(version, scheme, network)` capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedKind {
    /// Protocol version.
    pub x402_version: u32,

    /// Payment scheme identifier.
    pub scheme: String,

    /// Network identifier.
    pub network: Network,

    /// Family-specific capability data, e.g. `{"feePayer": "..."}` on Solana.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl SupportedKind {
    /// An `exact` kind at the current protocol version.
    #[must_use]
    pub fn exact(network: impl Into<Network>, extra: Option<Value>) -> Self {
        Self {
            x402_version: X402_VERSION,
            scheme: EXACT_SCHEME.to_owned(),
            network: network.into(),
            extra,
        }
    }
}

/// Body of `GET /supported`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedResponse {
    /// Advertised payment kinds.
    pub kinds: Vec<SupportedKind>,
}
