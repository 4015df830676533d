//! API client for the subdomain REST service.
//!
//! Listing is public. Ordering and the token refresh endpoint sit behind the
//! account service's JWTs: the access token is sent as a bearer header when
//! the client has one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::TokenRefresher;
use crate::config::Config;
use crate::models::{NewSubdomain, Subdomain, UserId};

use super::ApiError;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Fallback message when a rejected order carries no `detail`
const CREATE_FAILED_MESSAGE: &str = "Failed to create subdomain.";

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `https://host/api`)
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: Arc::clone(&self.base_url),
            token: token.map(Arc::from),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> ApiResult<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidResponse("Access token is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> ApiResult<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(url = url, error = %e, "Failed to parse JSON response");
            ApiError::InvalidResponse(format!("Unexpected response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        debug!(url = url, "GET");
        let response = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, url).await
    }

    // ===== Session =====

    /// Exchange a refresh token for a fresh access token. Never retried.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> ApiResult<String> {
        let url = self.url("token/refresh/");
        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh: refresh_token })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let parsed: RefreshResponse = Self::parse_json(response, &url).await?;
        Ok(parsed.access)
    }

    // ===== Subdomains =====

    /// Fetch every subdomain on record
    pub async fn list_subdomains(&self) -> ApiResult<Vec<Subdomain>> {
        self.get(&self.url("subdomains/")).await
    }

    /// Fetch the subdomains ordered by one account
    pub async fn list_user_subdomains(&self, user_id: &UserId) -> ApiResult<Vec<Subdomain>> {
        self.get(&self.url(&format!("subdomains/users/{}/", user_id))).await
    }

    /// Submit a new subdomain order.
    ///
    /// A rejected order surfaces the server's `detail` message so the form can
    /// show it verbatim.
    pub async fn create_subdomain(&self, order: &NewSubdomain) -> ApiResult<Subdomain> {
        let url = self.url("subdomains/");
        debug!(url = %url, name = %order.name, "POST");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(order)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized);
            }
            let message = ApiError::detail_from_body(&body)
                .unwrap_or_else(|| CREATE_FAILED_MESSAGE.to_string());
            warn!(status = %status, message = %message, "Subdomain order rejected");
            return Err(ApiError::Rejected(message));
        }

        Self::parse_json(response, &url).await
    }
}

#[async_trait]
impl TokenRefresher for ApiClient {
    async fn refresh(&self, refresh_token: &str) -> anyhow::Result<String> {
        Ok(self.refresh_access_token(refresh_token).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve a single canned HTTP response and hand back the raw request.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}/api", addr), handle)
    }

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let api = client("https://example.org/api/");
        assert_eq!(api.url("subdomains/"), "https://example.org/api/subdomains/");
        assert_eq!(api.url("/token/refresh/"), "https://example.org/api/token/refresh/");
    }

    #[tokio::test]
    async fn test_refresh_posts_refresh_token() {
        let (base, server) = serve_once("200 OK", r#"{"access": "A1"}"#).await;
        let access = client(&base).refresh_access_token("T1").await.unwrap();
        assert_eq!(access, "A1");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/token/refresh/ "));
        assert!(request.contains(r#"{"refresh":"T1"}"#));
    }

    #[tokio::test]
    async fn test_refresh_unauthorized() {
        let (base, _server) = serve_once("401 Unauthorized", r#"{"detail": "Token is invalid or expired"}"#).await;
        let err = client(&base).refresh_access_token("T1").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_list_user_subdomains_path() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"id": 4, "name": "blog", "purpose": "", "status": "pending", "user": 7}]"#,
        )
        .await;
        let list = client(&base).list_user_subdomains(&UserId::from(7)).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "blog");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/subdomains/users/7/ "));
    }

    #[tokio::test]
    async fn test_create_sends_bearer_and_surfaces_detail() {
        let (base, server) = serve_once(
            "400 Bad Request",
            r#"{"detail": "Subdomain with this name already exists."}"#,
        )
        .await;
        let api = client(&base).with_token(Some("A1".to_string()));
        let order = NewSubdomain::new("blog", UserId::from(7), "Team blog");
        let err = api.create_subdomain(&order).await.unwrap_err();
        assert_eq!(err.user_message(), "Subdomain with this name already exists.");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.contains("authorization: bearer a1"));
    }

    #[tokio::test]
    async fn test_create_without_detail_uses_fallback_message() {
        let (base, _server) = serve_once("400 Bad Request", r#"{"name": ["This field is required."]}"#).await;
        let order = NewSubdomain::new("", UserId::from(7), "");
        let err = client(&base).create_subdomain(&order).await.unwrap_err();
        assert_eq!(err.user_message(), CREATE_FAILED_MESSAGE);
    }
}
