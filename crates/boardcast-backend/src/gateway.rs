use async_trait::async_trait;
use reqwest::Client;

use crate::consts::{DEFAULT_REQUEST_TIMEOUT, HEALTH_PATH, MISSING_MESSAGE_TEXT, SEND_MSG_PATH};
use crate::error::BackendError;
use crate::types::{HealthResponse, MessageRequest, MessageResponse};

/// Request/response side of the chess backend. One call per manual trigger;
/// no retries here, the caller decides whether to try again.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Ask the backend for the announcement text behind a manual trigger.
    /// `reason` travels to the backend as the `message` field.
    async fn request_announcement(
        &self,
        user_id: &str,
        reason: &str,
    ) -> Result<String, BackendError>;

    /// Cheap reachability probe.
    async fn health(&self) -> Result<HealthResponse, BackendError>;
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Builds a gateway with the default per-request deadline. A request that
    /// outlives the deadline surfaces as `BackendError::Http`.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(DEFAULT_REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn request_announcement(
        &self,
        user_id: &str,
        reason: &str,
    ) -> Result<String, BackendError> {
        let body = MessageRequest {
            message: reason.to_string(),
            user_id: user_id.to_string(),
        };

        let response = self
            .client
            .post(format!("{}{SEND_MSG_PATH}", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let parsed: MessageResponse = serde_json::from_str(&text)?;
        Ok(parsed
            .message
            .unwrap_or_else(|| MISSING_MESSAGE_TEXT.to_string()))
    }

    async fn health(&self) -> Result<HealthResponse, BackendError> {
        let response = self
            .client
            .get(format!("{}{HEALTH_PATH}", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
