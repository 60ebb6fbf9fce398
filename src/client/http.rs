//! `reqwest`-backed transport

use crate::client::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::core::error::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::collections::BTreeMap;
use std::time::Duration;

/// HTTP transport talking to a live backend
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` (e.g. `http://localhost:8080`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::transport(e.to_string()))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Wrap an already configured `reqwest` client
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .client
            .request(Self::method(request.method), &url)
            .query(&request.query);

        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body)?;
            builder = builder
                .header(
                    CONTENT_TYPE,
                    request.content_type.unwrap_or("application/json"),
                )
                .body(bytes);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;

        // Error pages are not always JSON; keep them as a string body
        let body = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(_) if !(200..300).contains(&status) => Some(serde_json::Value::String(
                    String::from_utf8_lossy(&bytes).into_owned(),
                )),
                Err(e) => {
                    return Err(ClientError::malformed(format!(
                        "response body is not JSON: {}",
                        e
                    )));
                }
            }
        };

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
