//! Primary delivery to the external form backend

use super::payload::FormPayload;
use crate::config::FormConfig;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("form backend responded with status {0}")]
    Status(u16),

    #[error("form backend request failed: {0}")]
    Request(String),

    #[error("HTTP client could not be built: {0}")]
    Client(String),

    #[error("native form submission could not be dispatched: {0}")]
    Fallback(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the payload and returns the HTTP status the backend answered with.
    async fn deliver(&self, payload: &FormPayload) -> Result<u16, TransportError>;
}

/// Posts `application/x-www-form-urlencoded` bodies to a fixed endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &FormConfig) -> Result<Self, TransportError> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, payload: &FormPayload) -> Result<u16, TransportError> {
        debug!(endpoint = %self.endpoint, form = payload.form_name(), "posting form to backend");

        let response = self
            .client
            .post(&self.endpoint)
            .form(payload.fields())
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(response.status().as_u16())
    }
}
