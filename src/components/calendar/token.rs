use crate::error::{auth_error, BoardResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Microsoft identity platform token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
const CALENDAR_SCOPE: &str = "Calendars.Read offline_access";

/// Supplies bearer tokens to the Graph provider
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current access token
    async fn access_token(&self) -> BoardResult<String>;

    /// Obtain a fresh access token after the current one was rejected
    async fn refresh(&self) -> BoardResult<String>;
}

/// Pre-authorized token that cannot be renewed
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> BoardResult<String> {
        Ok(self.token.clone())
    }

    async fn refresh(&self) -> BoardResult<String> {
        Err(auth_error(
            "Access token was rejected and no refresh credentials are configured",
        ))
    }
}

/// Credentials for the OAuth2 refresh-token grant
#[derive(Debug, Clone)]
pub struct RefreshCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Access token that renews itself with a refresh token when rejected
pub struct RefreshingToken {
    client: Client,
    credentials: RwLock<RefreshCredentials>,
    current: RwLock<String>,
}

impl RefreshingToken {
    pub fn new(
        client: Client,
        access_token: impl Into<String>,
        credentials: RefreshCredentials,
    ) -> Self {
        Self {
            client,
            credentials: RwLock::new(credentials),
            current: RwLock::new(access_token.into()),
        }
    }
}

#[async_trait]
impl TokenSource for RefreshingToken {
    async fn access_token(&self) -> BoardResult<String> {
        Ok(self.current.read().await.clone())
    }

    async fn refresh(&self) -> BoardResult<String> {
        let credentials = self.credentials.read().await.clone();
        debug!(token_url = %credentials.token_url, "Refreshing Graph access token");

        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
            ("scope", CALENDAR_SCOPE),
        ];

        let response = self
            .client
            .post(&credentials.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        // Identity platform may rotate the refresh token
        if let Some(rotated) = token.refresh_token {
            self.credentials.write().await.refresh_token = rotated;
        }
        *self.current.write().await = token.access_token.clone();

        info!(expires_in = token.expires_in.unwrap_or(3600), "Graph access token refreshed");
        Ok(token.access_token)
    }
}
