//! [`Backend`] over the REST API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, warn};

use clinic_desk_core::api::{ApiError, ApiResult, Backend};

use crate::config::ClientConfig;

/// Talks JSON to the backend over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a route path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get(&self, path: &str) -> ApiResult<Value> {
        debug!(path, "GET");
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(transport)?;
        json_body(path, check_status(path, resp).await?).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        debug!(path, "POST");
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        json_body(path, check_status(path, resp).await?).await
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        debug!(path, "DELETE");
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .map_err(transport)?;
        check_status(path, resp).await?;
        Ok(())
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

/// Turn non-2xx responses into [`ApiError::Status`], keeping the body text.
async fn check_status(path: &str, resp: Response) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(path, status = status.as_u16(), "backend rejected request");
    Err(ApiError::Status {
        path: path.to_string(),
        status: status.as_u16(),
        body,
    })
}

async fn json_body(path: &str, resp: Response) -> ApiResult<Value> {
    let bytes = resp.bytes().await.map_err(transport)?;
    parse_body(path, &bytes)
}

/// Decode a success body. An empty body reads as `null`.
fn parse_body(path: &str, bytes: &[u8]) -> ApiResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::decode(path, e))
}
