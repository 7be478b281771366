//! HTTP plumbing shared by the telemetry source and the notifiers

use std::time::Duration;

use async_trait::async_trait;

use crate::VoltcheckError;

/// Status and body of a completed request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The requests the service makes, injectable for tests
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// POST an `application/x-www-form-urlencoded` body
    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> crate::Result<HttpResponse>;
}

/// [`HttpClient`] backed by reqwest
#[derive(Debug, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VoltcheckError::Http(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        method: &str,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> crate::Result<HttpResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| VoltcheckError::Http(format!("{} {} failed: {}", method, url, e)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| VoltcheckError::Http(format!("{} {} body: {}", method, url, e)))?;

        tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        self.send("GET", url, self.client.get(url)).await
    }

    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> crate::Result<HttpResponse> {
        let request = self.client.post(url).form(params);
        self.send("POST", url, request).await
    }
}
