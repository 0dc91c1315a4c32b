//! Credential source for every upstream adapter. Access tokens authenticate
//! the tooling's own REST calls; identity tokens are minted per audience and
//! attached to queued task deliveries. Both come from the GCE metadata
//! server, which is the only credential channel available to the deployed
//! services.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

const METADATA_BASE_URL: &str = "http://metadata.google.internal";
const METADATA_FLAVOR: &str = "Metadata-Flavor";
/// Refresh an access token once it has less than this long to live.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("metadata server request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("metadata server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Source of bearer credentials for upstream calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// OAuth2 access token for direct API calls.
    async fn access_token(&self) -> Result<String, AuthError>;

    /// OIDC identity token scoped to `audience`, for authenticated task
    /// delivery targets.
    async fn identity_token(&self, audience: &str) -> Result<String, AuthError>;
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() + EXPIRY_MARGIN < self.ttl
    }
}

/// [`TokenProvider`] backed by the GCE metadata server. Access tokens are
/// cached until close to expiry; identity tokens are not cached because the
/// audience varies per handler service.
pub struct MetadataTokenProvider {
    http: reqwest::Client,
    base_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataTokenProvider {
    pub fn new() -> Self {
        Self::with_base_url(METADATA_BASE_URL)
    }

    /// Test seam: point the provider at a fake metadata server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, AuthError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .header(METADATA_FLAVOR, "Google")
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AuthError::Status { status, body });
        }
        Ok(res)
    }
}

impl Default for MetadataTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh()
        {
            return Ok(token.token.clone());
        }

        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.base_url
        );
        let parsed: AccessTokenResponse = self.fetch(&url, &[]).await?.json().await?;
        *cached = Some(CachedToken {
            token: parsed.access_token.clone(),
            fetched_at: Instant::now(),
            ttl: Duration::from_secs(parsed.expires_in),
        });
        Ok(parsed.access_token)
    }

    async fn identity_token(&self, audience: &str) -> Result<String, AuthError> {
        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/identity",
            self.base_url
        );
        Ok(self
            .fetch(&url, &[("audience", audience)])
            .await?
            .text()
            .await?)
    }
}

/// Fixed-token provider for tests and local runs against emulators.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }

    async fn identity_token(&self, _audience: &str) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }
}

/// Shared handle the adapter crates take.
pub type SharedTokenProvider = Arc<dyn TokenProvider>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::header;
    use wiremock::matchers::method;
    use wiremock::matchers::path;
    use wiremock::matchers::query_param;

    #[tokio::test]
    async fn access_token_is_cached_until_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/computeMetadata/v1/instance/service-accounts/default/token",
            ))
            .and(header(METADATA_FLAVOR, "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-1",
                "expires_in": 3600,
                "token_type": "Bearer",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = MetadataTokenProvider::with_base_url(server.uri());
        assert_eq!(provider.access_token().await.unwrap(), "tok-1");
        assert_eq!(provider.access_token().await.unwrap(), "tok-1");
    }

    #[tokio::test]
    async fn identity_token_carries_audience() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/computeMetadata/v1/instance/service-accounts/default/identity",
            ))
            .and(query_param("audience", "https://svc-123.us-central1.run.app"))
            .respond_with(ResponseTemplate::new(200).set_body_string("jwt-abc"))
            .mount(&server)
            .await;

        let provider = MetadataTokenProvider::with_base_url(server.uri());
        let token = provider
            .identity_token("https://svc-123.us-central1.run.app")
            .await
            .unwrap();
        assert_eq!(token, "jwt-abc");
    }

    #[tokio::test]
    async fn metadata_errors_surface_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no default account"))
            .mount(&server)
            .await;

        let provider = MetadataTokenProvider::with_base_url(server.uri());
        let err = provider.access_token().await.unwrap_err();
        match err {
            AuthError::Status { status, body } => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert_eq!(body, "no default account");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
