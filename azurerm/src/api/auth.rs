//! Azure AD token acquisition.
//!
//! The provider authenticates with a client-credentials grant against the
//! tenant's token endpoint and caches the resulting bearer token until
//! shortly before expiry. A static token (ARM_ACCESS_TOKEN) bypasses the
//! flow entirely, which is what the mock-backed tests use.

use super::error::ApiError;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tokens are refreshed this long before their reported expiry.
const REFRESH_WINDOW_MINUTES: i64 = 5;

#[derive(Clone)]
pub struct TokenSource {
    inner: Arc<TokenSourceInner>,
}

struct TokenSourceInner {
    http: reqwest::Client,
    credential: Credential,
    cache: RwLock<Option<CachedToken>>,
}

enum Credential {
    Static(String),
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
        authority_host: String,
        scope: String,
    },
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl TokenSource {
    pub fn static_token(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TokenSourceInner {
                http: reqwest::Client::new(),
                credential: Credential::Static(token.into()),
                cache: RwLock::new(None),
            }),
        }
    }

    pub fn client_secret(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authority_host: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(TokenSourceInner {
                http: reqwest::Client::new(),
                credential: Credential::ClientSecret {
                    tenant_id: tenant_id.into(),
                    client_id: client_id.into(),
                    client_secret: client_secret.into(),
                    authority_host: authority_host.into(),
                    scope: scope.into(),
                },
                cache: RwLock::new(None),
            }),
        }
    }

    /// A bearer token for the configured scope, from cache when still
    /// fresh.
    pub async fn token(&self) -> Result<String, ApiError> {
        let (tenant_id, client_id, client_secret, authority_host, scope) =
            match &self.inner.credential {
                Credential::Static(token) => return Ok(token.clone()),
                Credential::ClientSecret {
                    tenant_id,
                    client_id,
                    client_secret,
                    authority_host,
                    scope,
                } => (tenant_id, client_id, client_secret, authority_host, scope),
            };

        if let Some(cached) = &*self.inner.cache.read().await {
            if cached.expires_at - Duration::minutes(REFRESH_WINDOW_MINUTES) > Utc::now() {
                return Ok(cached.token.clone());
            }
        }

        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            authority_host.trim_end_matches('/'),
            tenant_id
        );

        tracing::debug!(tenant_id = %tenant_id, "requesting token");

        let response = self
            .inner
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("scope", scope),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Auth(format!("invalid token response: {}", e)))?;

        let cached = CachedToken {
            token: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        };
        *self.inner.cache.write().await = Some(cached);

        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_is_returned_verbatim() {
        let source = TokenSource::static_token("header.payload.signature");
        assert_eq!(source.token().await.unwrap(), "header.payload.signature");
    }

    #[tokio::test]
    async fn client_secret_flow_fetches_and_caches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tenant-1/oauth2/v2.0/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok-1","expires_in":3600,"token_type":"Bearer"}"#)
            .expect(1)
            .create_async()
            .await;

        let source = TokenSource::client_secret(
            "tenant-1",
            "client-1",
            "secret",
            server.url(),
            "https://management.azure.com/.default",
        );

        assert_eq!(source.token().await.unwrap(), "tok-1");
        // Second call is served from cache; the mock's expect(1) enforces it.
        assert_eq!(source.token().await.unwrap(), "tok-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn token_endpoint_failure_surfaces_as_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/tenant-1/oauth2/v2.0/token")
            .with_status(401)
            .with_body(r#"{"error":"invalid_client"}"#)
            .create_async()
            .await;

        let source = TokenSource::client_secret(
            "tenant-1",
            "client-1",
            "wrong",
            server.url(),
            "https://management.azure.com/.default",
        );

        let err = source.token().await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
    }
}
