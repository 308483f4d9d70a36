//! Axum route handlers for the facilitator HTTP API.
//!
//! - `GET /supported` - payment kinds this facilitator serves
//! - `POST /verify`, `POST /settle` - dispatch a payment envelope
//! - `GET /verify`, `GET /settle` - describe the expected request body
//! - `GET /` and `GET /health` - service info and liveness
//!
//! Anything else answers 404 with the standard error body.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use pay402::Facilitator;
use pay402::proto::{EnvelopeRequest, SettleResult, SupportedResponse, VerifyResult};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Environment;
use crate::error::ApiError;

/// Service name reported by `GET /`.
pub const SERVICE_NAME: &str = "x402 Facilitator";

/// Shared application state.
#[derive(Debug, Clone)]
pub struct FacilitatorState {
    facilitator: Arc<Facilitator>,
    environment: Environment,
}

impl FacilitatorState {
    /// Creates the state shared by all handlers.
    #[must_use]
    pub const fn new(facilitator: Arc<Facilitator>, environment: Environment) -> Self {
        Self {
            facilitator,
            environment,
        }
    }

    /// The dispatch engine.
    #[must_use]
    pub fn facilitator(&self) -> &Facilitator {
        &self.facilitator
    }

    /// Deployment environment.
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }
}

/// Shape of the JSON body accepted by a POST endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointInfo {
    /// Endpoint path.
    pub endpoint: &'static str,
    /// What POSTing to it does.
    pub description: &'static str,
    /// Expected body fields and their types.
    pub body: EndpointBody,
}

/// Field types of an envelope request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointBody {
    /// Type of `paymentPayload`.
    pub payment_payload: &'static str,
    /// Type of `paymentRequirements`.
    pub payment_requirements: &'static str,
}

impl EndpointInfo {
    const fn envelope(endpoint: &'static str, description: &'static str) -> Self {
        Self {
            endpoint,
            description,
            body: EndpointBody {
                payment_payload: "PaymentPayload",
                payment_requirements: "PaymentRequirements",
            },
        }
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    /// Service name.
    pub service: &'static str,
    /// Always `"healthy"`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Unix timestamp of the response.
    pub timestamp: u64,
    /// Deployment environment.
    pub environment: Environment,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Unix timestamp of the response.
    pub timestamp: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// `GET /supported` - Lists the payment kinds this facilitator serves.
pub async fn get_supported(State(state): State<FacilitatorState>) -> Json<SupportedResponse> {
    Json(state.facilitator.list_supported_kinds().await)
}

/// `GET /verify` - Describes the verify request body.
pub async fn get_verify_info() -> Json<EndpointInfo> {
    Json(EndpointInfo::envelope("/verify", "POST to verify x402 payments"))
}

/// `POST /verify` - Verifies a payment envelope.
///
/// # Errors
///
/// Returns 400 on a malformed body, a schema violation or an execution
/// failure.
pub async fn post_verify(
    State(state): State<FacilitatorState>,
    body: Result<Json<EnvelopeRequest>, JsonRejection>,
) -> Result<Json<VerifyResult>, ApiError> {
    let Json(body) = body?;
    let result = state
        .facilitator
        .verify_payment(&body.payment_payload, &body.payment_requirements)
        .await
        .map_err(ApiError::verify)?;
    Ok(Json(result))
}

/// `GET /settle` - Describes the settle request body.
pub async fn get_settle_info() -> Json<EndpointInfo> {
    Json(EndpointInfo::envelope("/settle", "POST to settle x402 payments"))
}

/// `POST /settle` - Settles a payment envelope.
///
/// # Errors
///
/// Returns 400 on a malformed body, a schema violation or an execution
/// failure.
pub async fn post_settle(
    State(state): State<FacilitatorState>,
    body: Result<Json<EnvelopeRequest>, JsonRejection>,
) -> Result<Json<SettleResult>, ApiError> {
    let Json(body) = body?;
    let result = state
        .facilitator
        .settle_payment(&body.payment_payload, &body.payment_requirements)
        .await
        .map_err(ApiError::settle)?;
    Ok(Json(result))
}

/// `GET /` - Service info.
pub async fn get_root(State(state): State<FacilitatorState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: unix_now(),
        environment: state.environment,
    })
}

/// `GET /health` - Liveness probe.
pub async fn get_health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: unix_now(),
    })
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Creates an Axum [`Router`] with all facilitator endpoints.
pub fn facilitator_router(state: FacilitatorState) -> Router {
    Router::new()
        .route("/", get(get_root))
        .route("/health", get(get_health))
        .route("/supported", get(get_supported))
        .route("/verify", get(get_verify_info).post(post_verify))
        .route("/settle", get(get_settle_info).post(post_settle))
        .fallback(not_found)
        .with_state(state)
}

/// CORS policy: any origin outside production, `allowed_origins` in
/// production.
///
/// Origins that are not valid header values are dropped.
pub fn cors_layer<'a>(
    environment: Environment,
    allowed_origins: impl IntoIterator<Item = &'a str>,
) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if environment != Environment::Production {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
