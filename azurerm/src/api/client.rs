//! Resource Manager HTTP client.
//!
//! One `ArmClient` is shared by every service client. Paths are full ARM
//! resource paths (`/subscriptions/.../providers/...`); each call pins its
//! service's `api-version`. Retries with exponential backoff cover 429 and
//! 5xx responses, which ARM hands out freely under subscription-level
//! throttling.

use super::auth::TokenSource;
use super::error::{ApiError, CloudErrorEnvelope};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct ArmClient {
    inner: Arc<ArmClientInner>,
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient")
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

struct ArmClientInner {
    http: reqwest::Client,
    endpoint: String,
    token_source: TokenSource,
    retry: RetryConfig,
}

#[derive(Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 30000,
            timeout_seconds: 60,
        }
    }
}

enum Body<'a, B: Serialize> {
    None,
    Json(&'a B),
}

impl ArmClient {
    pub fn new(endpoint: &str, token_source: TokenSource) -> Result<Self, ApiError> {
        Self::with_config(endpoint, token_source, RetryConfig::default())
    }

    pub fn with_config(
        endpoint: &str,
        token_source: TokenSource,
        retry: RetryConfig,
    ) -> Result<Self, ApiError> {
        let parsed =
            url::Url::parse(endpoint).map_err(|e| ApiError::Endpoint(format!("{}: {}", endpoint, e)))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(ApiError::Endpoint(format!(
                "unsupported scheme \"{}\"",
                parsed.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(retry.timeout_seconds))
            .build()?;

        Ok(Self {
            inner: Arc::new(ArmClientInner {
                http,
                endpoint: endpoint.trim_end_matches('/').to_string(),
                token_source,
                retry,
            }),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// GET a resource. 404 surfaces as a `Cloud` error answering
    /// `was_not_found()`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<T, ApiError> {
        let body = self
            .execute_with_retry(reqwest::Method::GET, path, api_version, Body::<()>::None)
            .await?;
        parse_body(&body, path)
    }

    /// PUT a resource. Returns the response model when the service sent one
    /// back; 202-with-empty-body long-running operations return `None` and
    /// callers poll the resource's provisioning state.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let response = self
            .execute_with_retry(reqwest::Method::PUT, path, api_version, Body::Json(body))
            .await?;
        parse_optional_body(&response, path)
    }

    /// PATCH a resource; same body semantics as `put`.
    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let response = self
            .execute_with_retry(reqwest::Method::PATCH, path, api_version, Body::Json(body))
            .await?;
        parse_optional_body(&response, path)
    }

    /// DELETE a resource. Deleting something already gone is the caller's
    /// call to tolerate via `was_not_found()`.
    pub async fn delete(&self, path: &str, api_version: &str) -> Result<(), ApiError> {
        self.execute_with_retry(reqwest::Method::DELETE, path, api_version, Body::<()>::None)
            .await
            .map(|_| ())
    }

    async fn execute_with_retry<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        api_version: &str,
        body: Body<'_, B>,
    ) -> Result<String, ApiError> {
        let url = format!(
            "{}{}?api-version={}",
            self.inner.endpoint, path, api_version
        );

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.inner.retry.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner.retry.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    self.inner.retry.max_backoff_ms,
                );
                tracing::debug!(url = %url, backoff_ms = backoff, attempt, "retrying request");
                tokio::time::sleep(tokio::time::Duration::from_millis(backoff)).await;
            }
            attempt += 1;

            let token = self.inner.token_source.token().await?;

            tracing::debug!(method = %method, url = %url, "sending request");

            let mut request = self
                .inner
                .http
                .request(method.clone(), &url)
                .header(AUTHORIZATION, format!("Bearer {}", token));
            if let Body::Json(b) = &body {
                request = request.json(b);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.text().await?);
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(ApiError::Auth(
                            "the access token was rejected".to_string(),
                        ));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                        continue;
                    }
                    if status.is_server_error() {
                        last_error = Some(ApiError::ServiceUnavailable);
                        continue;
                    }

                    // Remaining client errors are not retryable.
                    let text = response.text().await.unwrap_or_default();
                    let (code, message) = match serde_json::from_str::<CloudErrorEnvelope>(&text) {
                        Ok(envelope) => envelope.into_parts(),
                        Err(_) => ("UnknownError".to_string(), text),
                    };
                    return Err(ApiError::Cloud {
                        status: status.as_u16(),
                        code,
                        message,
                    });
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(ApiError::Timeout(self.inner.retry.timeout_seconds));
                    } else if e.is_connect() || e.is_request() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::Request(e));
                    }
                }
            }
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }
}

fn parse_body<T: DeserializeOwned>(body: &str, path: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(path = %path, error = %e, "failed to deserialize response");
        ApiError::Parse(format!("{} for {}", e, path))
    })
}

fn parse_optional_body<T: DeserializeOwned>(body: &str, path: &str) -> Result<Option<T>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    parse_body(body, path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Widget {
        name: String,
    }

    fn client(endpoint: String) -> ArmClient {
        ArmClient::new(&endpoint, TokenSource::static_token("test-token")).unwrap()
    }

    #[tokio::test]
    async fn get_sends_bearer_and_api_version() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/subscriptions/sub-1/widgets/w1")
            .match_query(mockito::Matcher::UrlEncoded(
                "api-version".into(),
                "2023-01-31".into(),
            ))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(r#"{"name":"w1"}"#)
            .create_async()
            .await;

        let widget: Widget = client(server.url())
            .get("/subscriptions/sub-1/widgets/w1", "2023-01-31")
            .await
            .unwrap();

        assert_eq!(widget.name, "w1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_maps_to_cloud_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/subscriptions/sub-1/widgets/missing")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"nope"}}"#)
            .create_async()
            .await;

        let err = client(server.url())
            .get::<Widget>("/subscriptions/sub-1/widgets/missing", "2023-01-31")
            .await
            .unwrap_err();

        assert!(err.was_not_found());
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_the_budget_runs_out() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/flaky")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("busy")
            .expect(3) // initial attempt + two retries
            .create_async()
            .await;

        let arm = ArmClient::with_config(
            &server.url(),
            TokenSource::static_token("test-token"),
            RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 1,
                max_backoff_ms: 10,
                timeout_seconds: 5,
            },
        )
        .unwrap();

        let err = arm.get::<Widget>("/flaky", "2023-01-31").await.unwrap_err();
        assert!(matches!(err, ApiError::ServiceUnavailable));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn put_with_empty_body_returns_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/slow")
            .match_query(mockito::Matcher::Any)
            .with_status(202)
            .with_body("")
            .create_async()
            .await;

        let result: Option<Widget> = client(server.url())
            .put("/slow", "2023-01-31", &serde_json::json!({}))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn rejects_non_http_endpoints() {
        let err = ArmClient::new("ftp://example.com", TokenSource::static_token("t")).unwrap_err();
        assert!(matches!(err, ApiError::Endpoint(_)));
    }
}
