//! `HttpClient` backed by reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ResponseType},
};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Network access for the offline cache on desktop hosts.
///
/// Relative request URLs (`/static/js/bundle.js`, `./`) are resolved
/// against the configured application origin, and responses from any other
/// origin are reported as `cors` so they stay out of the asset cache. No
/// retries: a failed attempt is the offline cache's signal to fall back.
pub struct ReqwestHttpClient {
    client: Client,
    origin: Option<Url>,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("musicist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            origin: None,
        }
    }

    /// Application origin, e.g. `https://musicist.app`.
    pub fn with_origin(mut self, origin: &str) -> Result<Self> {
        let origin = Url::parse(origin).map_err(|e| {
            BridgeError::OperationFailed(format!("Invalid origin {}: {}", origin, e))
        })?;
        self.origin = Some(origin);
        Ok(self)
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        let resolved = match &self.origin {
            Some(origin) => origin.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|e| BridgeError::Network(format!("Cannot fetch {}: {}", url, e)))
    }

    fn response_type(&self, url: &Url) -> ResponseType {
        match &self.origin {
            Some(origin) if origin.origin() != url.origin() => ResponseType::Cors,
            _ => ResponseType::Basic,
        }
    }
}

fn method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn network_error(url: &Url, error: reqwest::Error) -> BridgeError {
    let reason = if error.is_timeout() {
        "timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };
    BridgeError::Network(format!("{} {}", url, reason))
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = self.resolve(&request.url)?;
        let response_type = self.response_type(&url);
        debug!(url = %url, method = ?request.method, "Fetching");

        let mut builder = self.client.request(method(request.method), url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Fetch failed");
            network_error(&url, e)
        })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| network_error(&url, e))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            response_type,
        })
    }

    async fn is_connected(&self) -> bool {
        match &self.origin {
            Some(origin) => self
                .client
                .head(origin.clone())
                .timeout(PROBE_TIMEOUT)
                .send()
                .await
                .is_ok(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_client() -> ReqwestHttpClient {
        ReqwestHttpClient::new()
            .unwrap()
            .with_origin("https://musicist.app/")
            .unwrap()
    }

    #[test]
    fn test_relative_urls_resolve_against_origin() {
        let client = app_client();
        assert_eq!(
            client.resolve("/static/js/bundle.js").unwrap().as_str(),
            "https://musicist.app/static/js/bundle.js"
        );
        assert_eq!(
            client.resolve("./").unwrap().as_str(),
            "https://musicist.app/"
        );
    }

    #[test]
    fn test_relative_url_without_origin_is_network_error() {
        let client = ReqwestHttpClient::new().unwrap();
        assert!(matches!(
            client.resolve("/index.html"),
            Err(BridgeError::Network(_))
        ));
    }

    #[test]
    fn test_foreign_origin_is_cors() {
        let client = app_client();
        let own = client.resolve("/manifest.json").unwrap();
        let cdn = client.resolve("https://cdn.example.com/font.woff2").unwrap();

        assert_eq!(client.response_type(&own), ResponseType::Basic);
        assert_eq!(client.response_type(&cdn), ResponseType::Cors);
    }

    #[test]
    fn test_invalid_origin_rejected() {
        let result = ReqwestHttpClient::new().unwrap().with_origin("not a url");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = ReqwestHttpClient::with_timeout(Duration::from_millis(500)).unwrap();
        let result = client
            .execute(HttpRequest::get("http://127.0.0.1:9/song.mp3"))
            .await;

        assert!(matches!(result, Err(BridgeError::Network(_))));
    }
}
