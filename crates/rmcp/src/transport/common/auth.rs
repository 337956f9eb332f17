//! Client-credentials OAuth2 token acquisition for attaching `Authorization:
//! Bearer` headers to outbound requests.
//!
//! Full OAuth/JWT validation (authorization-code flow, PKCE, token
//! introspection) is out of scope here - this covers exactly the one grant
//! type a machine-to-machine MCP client needs: trade a client id/secret for
//! an access token, cache it, and refresh once it's close to expiring.

use std::sync::Arc;
use std::time::{Duration, Instant};

use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, ClientSecret, Scope, TokenResponse, TokenUrl};
use tokio::sync::RwLock;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("oauth2 request failed: {0}")]
    Request(String),
    #[error("invalid token endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Static configuration for a client-credentials grant against a single
/// authorization server.
#[derive(Debug, Clone)]
pub struct OAuthClientCredentialsConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: Url,
    pub scopes: Vec<String>,
}

struct CachedToken {
    bearer: String,
    expires_at: Instant,
}

/// Holds the most recently obtained access token and re-requests one once it
/// is within [`Self::refresh_margin`] of expiring. Cheap to clone - wrap it
/// in `Arc` and share across requests.
pub struct AuthorizationManager {
    http: reqwest::Client,
    config: OAuthClientCredentialsConfig,
    refresh_margin: Duration,
    cached: RwLock<Option<CachedToken>>,
}

impl AuthorizationManager {
    pub fn new(config: OAuthClientCredentialsConfig) -> Arc<Self> {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: OAuthClientCredentialsConfig, http: reqwest::Client) -> Arc<Self> {
        Arc::new(Self {
            http,
            config,
            refresh_margin: Duration::from_secs(30),
            cached: RwLock::new(None),
        })
    }

    /// Returns a `"Bearer <token>"` header value, fetching or refreshing the
    /// underlying access token as needed.
    pub async fn bearer_header(&self) -> Result<String, AuthError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.expires_at > Instant::now() + self.refresh_margin {
                return Ok(cached.bearer.clone());
            }
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<String, AuthError> {
        let client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.config.client_secret.clone()))
            .set_token_uri(TokenUrl::from_url(self.config.token_url.clone()))
            .set_auth_uri(AuthUrl::from_url(self.config.token_url.clone()));

        let mut request = client.exchange_client_credentials();
        for scope in &self.config.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }

        let token = request
            .request_async(&self.http)
            .await
            .map_err(|error| AuthError::Request(error.to_string()))?;

        let bearer = format!("Bearer {}", token.access_token().secret());
        let ttl = token
            .expires_in()
            .unwrap_or(Duration::from_secs(5 * 60));

        *self.cached.write().await = Some(CachedToken {
            bearer: bearer.clone(),
            expires_at: Instant::now() + ttl,
        });

        Ok(bearer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_holds_scopes() {
        let config = OAuthClientCredentialsConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            token_url: Url::parse("https://auth.example.com/token").unwrap(),
            scopes: vec!["mcp.read".into()],
        };
        assert_eq!(config.scopes, vec!["mcp.read".to_string()]);
    }
}
