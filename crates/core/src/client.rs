//! Outbound HTTP client for querying registered services.

use async_trait::async_trait;
use mosaic_tiles::Record;
use mosaic_types::ServiceAddr;

use crate::cache::parse_max_age;

/// Errors from a single service query.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("service {addr} returned error code {status}")]
    ErrorStatus { addr: ServiceAddr, status: u16 },
    #[error("failed to reach service {addr}: {source}")]
    Transport {
        addr: ServiceAddr,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode response from {addr}: {source}")]
    BodyDecode {
        addr: ServiceAddr,
        #[source]
        source: reqwest::Error,
    },
}

/// A decoded service response.
#[derive(Debug, Clone)]
pub struct ServiceReply {
    /// The response body. Always a record; non-object bodies are a decode
    /// error.
    pub body: Record,
    /// Freshness window from the response's `Cache-Control` header, if any.
    pub max_age: Option<f64>,
}

/// Issues one query to one service.
///
/// Abstracted so the aggregation pipeline can be driven by a scripted client
/// in tests.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Sends `payload` to the service at `addr` and decodes its reply.
    async fn fetch(&self, addr: &ServiceAddr, payload: &Record)
        -> Result<ServiceReply, ClientError>;
}

/// The production client: a GET carrying the payload as a JSON body, issued
/// to `http://{addr}`.
#[derive(Debug, Clone, Default)]
pub struct HttpServiceClient {
    http: reqwest::Client,
}

impl HttpServiceClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceClient for HttpServiceClient {
    async fn fetch(
        &self,
        addr: &ServiceAddr,
        payload: &Record,
    ) -> Result<ServiceReply, ClientError> {
        let url = format!("http://{addr}");
        let response = self
            .http
            .get(&url)
            .json(payload)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                addr: addr.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ClientError::ErrorStatus {
                addr: addr.clone(),
                status: status.as_u16(),
            });
        }

        let max_age = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_max_age);

        let body: Record = response
            .json()
            .await
            .map_err(|source| ClientError::BodyDecode {
                addr: addr.clone(),
                source,
            })?;

        Ok(ServiceReply { body, max_age })
    }
}
