//! A [`PaymentEngine`] that forwards to a remote execution service over HTTP.
//!
//! The service exposes `POST /verify` and `POST /settle`, both taking
//! `{x402Version, paymentPayload, paymentRequirements, config?}` and answering
//! with the x402 verify or settle result. Key material never leaves the
//! facilitator; only the network routing decision and execution config do.

use std::time::Duration;

use http::StatusCode;
use pay402::chain::{ChainError, ChainHandle, ExecutionConfig, Signer};
use pay402::engine::{EngineError, PaymentEngine};
use pay402::proto::{
    PaymentPayload, PaymentRequirements, SettleResult, VerifyResult, X402_VERSION,
};
use reqwest::Client;
use serde::Serialize;
use url::Url;

/// Errors that can occur while talking to the execution service.
#[derive(Debug, thiserror::Error)]
pub enum RemoteEngineError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// JSON deserialization error.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// Failed to read response body.
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

impl From<RemoteEngineError> for EngineError {
    fn from(err: RemoteEngineError) -> Self {
        match err {
            RemoteEngineError::HttpStatus { status, body, .. } => Self::HttpStatus {
                status: status.as_u16(),
                body,
            },
            other => Self::Transport(Box::new(other)),
        }
    }
}

/// Request body sent to the execution service.
///
/// `signer` is the address of the facilitator key the service must act as:
/// the fee payer on Solana, the settling account on EVM. It is absent when
/// verification only needs a read-only client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EngineRequest<'a> {
    x402_version: u32,
    network: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signer: Option<String>,
    payment_payload: &'a PaymentPayload,
    payment_requirements: &'a PaymentRequirements,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a ExecutionConfig>,
}

impl<'a> EngineRequest<'a> {
    const fn new(
        network: &'a str,
        signer: Option<String>,
        payment_payload: &'a PaymentPayload,
        payment_requirements: &'a PaymentRequirements,
        config: Option<&'a ExecutionConfig>,
    ) -> Self {
        Self {
            x402_version: X402_VERSION,
            network,
            signer,
            payment_payload,
            payment_requirements,
            config,
        }
    }
}

/// Client for a remote payment execution service.
#[derive(Clone, Debug)]
pub struct RemoteEngine {
    base_url: Url,
    verify_url: Url,
    settle_url: Url,
    client: Client,
    timeout: Option<Duration>,
}

impl RemoteEngine {
    /// Builds a client for the service at `base_url`.
    ///
    /// The endpoints are resolved below the full base path, so
    /// `http://host/api` posts to `http://host/api/verify`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteEngineError::UrlParse`] if the endpoint URLs cannot be
    /// derived from `base_url`.
    pub fn try_new(mut base_url: Url) -> Result<Self, RemoteEngineError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let verify_url = base_url
            .join("./verify")
            .map_err(|e| RemoteEngineError::UrlParse {
                context: "Failed to construct ./verify URL",
                source: e,
            })?;
        let settle_url = base_url
            .join("./settle")
            .map_err(|e| RemoteEngineError::UrlParse {
                context: "Failed to construct ./settle URL",
                source: e,
            })?;
        Ok(Self {
            base_url,
            verify_url,
            settle_url,
            client: Client::new(),
            timeout: None,
        })
    }

    /// Sets a timeout for every request.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Base URL of the service.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of `POST /verify`.
    #[must_use]
    pub const fn verify_url(&self) -> &Url {
        &self.verify_url
    }

    /// Full URL of `POST /settle`.
    #[must_use]
    pub const fn settle_url(&self) -> &Url {
        &self.settle_url
    }

    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
    ) -> Result<R, RemoteEngineError>
    where
        T: Serialize + Sync + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let mut req = self.client.post(url.clone()).json(payload);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| RemoteEngineError::Http { context, source: e })?;

        if http_response.status() == StatusCode::OK {
            http_response
                .json::<R>()
                .await
                .map_err(|e| RemoteEngineError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| RemoteEngineError::ResponseBodyRead { context, source: e })?;
            Err(RemoteEngineError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }
}

/// The service settles as the facilitator key, so it must be named.
fn signer_address(signer: &dyn Signer) -> Result<String, EngineError> {
    signer.address().ok_or_else(|| {
        EngineError::Transport(Box::new(ChainError::NoSignerAddress(
            signer.network().to_owned(),
        )))
    })
}

#[async_trait::async_trait]
impl PaymentEngine for RemoteEngine {
    async fn verify(
        &self,
        handle: &ChainHandle,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
        config: Option<&ExecutionConfig>,
    ) -> Result<VerifyResult, EngineError> {
        let signer = match handle {
            ChainHandle::Client(_) => None,
            ChainHandle::Signer(signer) => Some(signer_address(signer.as_ref())?),
        };
        tracing::debug!(
            network = handle.network(),
            signer = ?signer,
            url = %self.verify_url,
            "Forwarding verify"
        );
        let request = EngineRequest::new(handle.network(), signer, payload, requirements, config);
        let result = self
            .post_json(&self.verify_url, "POST /verify", &request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Request to execution engine failed"))?;
        Ok(result)
    }

    async fn settle(
        &self,
        signer: &dyn Signer,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
        config: Option<&ExecutionConfig>,
    ) -> Result<SettleResult, EngineError> {
        let address = signer_address(signer)?;
        tracing::debug!(
            network = signer.network(),
            signer = %address,
            url = %self.settle_url,
            "Forwarding settle"
        );
        let request =
            EngineRequest::new(signer.network(), Some(address), payload, requirements, config);
        let result = self
            .post_json(&self.settle_url, "POST /settle", &request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Request to execution engine failed"))?;
        Ok(result)
    }
}

/// Parses a base URL, normalizing it to exactly one trailing slash.
impl TryFrom<&str> for RemoteEngine {
    type Error = RemoteEngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_owned();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| RemoteEngineError::UrlParse {
            context: "Failed to parse base url",
            source: e,
        })?;
        Self::try_new(url)
    }
}
