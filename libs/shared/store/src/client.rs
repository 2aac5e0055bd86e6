use std::time::Duration;

use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::error::PortalError;

/// Thin JSON client for the remote portal API.
#[derive(Clone)]
pub struct PortalApiClient {
    client: Client,
    base_url: String,
}

impl PortalApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.api_base_url.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T, PortalError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers());

        if !query.is_empty() {
            req = req.query(query);
        }

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await.map_err(|e| {
            error!("Transport failure for {}: {}", url, e);
            if e.is_timeout() {
                PortalError::Transport(format!("request to {} timed out", path))
            } else {
                PortalError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(PortalError::StoreRejection(format!("API error ({}): {}", status, error_text)));
        }

        response.json::<T>().await.map_err(|e| {
            error!("Malformed response from {}: {}", url, e);
            PortalError::StoreRejection(format!("malformed response: {}", e))
        })
    }

    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, PortalError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Result<Value, PortalError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// POST and require the `{"status": "success"}` acknowledgement.
    pub async fn post_acknowledged(&self, path: &str, body: Value) -> Result<Value, PortalError> {
        let response = self.post_json(path, body).await?;
        ensure_success(&response)?;
        Ok(response)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// A 2xx body whose `status` is anything but `"success"` is still a rejection.
pub fn ensure_success(response: &Value) -> Result<(), PortalError> {
    match response.get("status").and_then(Value::as_str) {
        Some("success") => Ok(()),
        Some(other) => {
            let detail = response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(other);
            Err(PortalError::StoreRejection(detail.to_string()))
        }
        None => Err(PortalError::StoreRejection("response carried no status".to_string())),
    }
}
