//! HTTP client implementation

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Method};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{
    config::HttpConfig,
    error::{HttpError, Result},
    middleware::{Pacer, RetryConfig, RetryMiddleware},
};

/// Mockable JSON client trait
#[async_trait]
pub trait HttpClientTrait: Send + Sync {
    /// Execute a GET request
    async fn get_json(&self, url: &str) -> Result<Value>;

    /// Execute a POST request with a JSON body
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>;

    /// Execute a PATCH request with a JSON body
    async fn patch_json(&self, url: &str, body: &Value) -> Result<Value>;

    /// Execute a custom request
    async fn request_json(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value>;
}

/// Production HTTP client
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
    retry: RetryMiddleware,
    pacer: Pacer,
}

impl HttpClient {
    /// Create a new HTTP client with configuration
    pub fn new(config: HttpConfig) -> Result<Self> {
        Self::with_headers(config, HeaderMap::new())
    }

    /// Create a client that sends `headers` on every request
    pub fn with_headers(config: HttpConfig, headers: HeaderMap) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers);

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| HttpError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| HttpError::BuildError(e.to_string()))?;

        let retry_config = RetryConfig {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.retry_delay,
            max_delay: config.max_retry_delay,
        };

        Ok(Self {
            inner,
            retry: RetryMiddleware::new(retry_config),
            pacer: Pacer::new(config.pacing),
            config,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// One attempt, followed by the pacing delay whatever the outcome
    async fn send_once(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        let mut request = self.inner.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = read_response(request.send().await).await;
        self.pacer.pause().await;
        result
    }
}

async fn read_response(sent: reqwest::Result<reqwest::Response>) -> Result<Value> {
    let response = sent.map_err(HttpError::RequestFailed)?;
    let status = response.status();

    if !status.is_success() {
        return Err(HttpError::HttpStatus {
            status,
            message: response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string()),
        });
    }

    let bytes = response.bytes().await.map_err(HttpError::RequestFailed)?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| HttpError::Decode(e.to_string()))
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!("HTTP GET: {}", url);
        self.request_json(Method::GET, url, None).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        debug!("HTTP POST: {}", url);
        self.request_json(Method::POST, url, Some(body)).await
    }

    async fn patch_json(&self, url: &str, body: &Value) -> Result<Value> {
        debug!("HTTP PATCH: {}", url);
        self.request_json(Method::PATCH, url, Some(body)).await
    }

    async fn request_json(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let url = url
            .parse::<Url>()
            .map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        self.retry
            .execute(|| self.send_once(method.clone(), url.clone(), body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new(HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_client_creation_clamps_attempts() {
        let config = HttpConfig {
            timeout: Duration::from_secs(10),
            max_attempts: 0,
            ..Default::default()
        };

        let client = HttpClient::new(config).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(10));
        assert_eq!(client.retry.config().max_attempts, 1);
    }

    #[test]
    fn test_invalid_proxy() {
        let config = HttpConfig::default().with_proxy("invalid-proxy");

        let result = HttpClient::new(config);
        assert!(matches!(result, Err(HttpError::InvalidProxy(_))));
    }

    #[tokio::test]
    async fn test_get_invalid_url() {
        let client = HttpClient::new(HttpConfig::fast()).unwrap();
        let result = client.get_json("not a url").await;
        assert!(matches!(result, Err(HttpError::InvalidUrl(_))));
    }
}
