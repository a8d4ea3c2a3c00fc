//! OAuth2 authorization-code client for Google's token endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::oauth::token::OAuthToken;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const PHOTOS_LIBRARY_SCOPE: &str = "https://www.googleapis.com/auth/photoslibrary";

/// Registered OAuth2 client settings.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_url: Url,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Settings for Google Photos Library access.
    pub fn google_photos(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            redirect_url,
            scopes: vec![PHOTOS_LIBRARY_SCOPE.to_string()],
        }
    }
}

/// The provider side of the authorization-code grant.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// URL the operator opens to grant consent. `state` is echoed back.
    fn authorize_url(&self, state: &str) -> Result<Url>;

    /// Trade an authorization code for a token.
    async fn exchange_code(&self, code: &str) -> Result<OAuthToken>;

    /// Obtain a fresh access token using the refresh token.
    async fn refresh(&self, token: &OAuthToken) -> Result<OAuthToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token(self) -> OAuthToken {
        let mut token = OAuthToken::new(self.access_token);
        if let Some(token_type) = self.token_type.filter(|t| !t.is_empty()) {
            token.token_type = token_type;
        }
        token.refresh_token = self.refresh_token;
        token.expiry = self
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        token
    }
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// HTTP client for the token endpoint.
pub struct OAuthClient {
    http: Client,
    config: OAuthConfig,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<OAuthToken> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body.chars().take(200).collect(),
            };
            return Err(Error::OAuth(format!(
                "Token endpoint returned HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let response: TokenResponse = serde_json::from_str(&body)?;
        Ok(response.into_token())
    }
}

#[async_trait]
impl TokenEndpoint for OAuthClient {
    fn authorize_url(&self, state: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.auth_url)?;
        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_url.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthToken> {
        tracing::debug!("Exchanging authorization code for a token");
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ])
        .await
    }

    async fn refresh(&self, token: &OAuthToken) -> Result<OAuthToken> {
        let refresh_token = token.refresh_token.as_deref().ok_or_else(|| {
            Error::OAuth("Access token expired and no refresh token is available".to_string())
        })?;

        let mut fresh = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
            ])
            .await?;

        // Google omits the refresh token on refresh responses.
        if fresh.refresh_token.is_none() {
            fresh.refresh_token = Some(refresh_token.to_string());
        }
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Form, http::StatusCode, routing::post, Json, Router};
    use std::collections::HashMap;

    async fn spawn_token_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/token", addr)
    }

    fn config(token_url: String) -> OAuthConfig {
        let mut config = OAuthConfig::google_photos(
            "client-id",
            "client-secret",
            Url::parse("http://localhost:8080/callback").unwrap(),
        );
        config.token_url = token_url;
        config
    }

    #[test]
    fn test_authorize_url_parameters() {
        let client = OAuthClient::new(config(GOOGLE_TOKEN_URL.to_string())).unwrap();
        let url = client.authorize_url("state-123").unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert!(url.as_str().starts_with(GOOGLE_AUTH_URL));
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(params["redirect_uri"], "http://localhost:8080/callback");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], PHOTOS_LIBRARY_SCOPE);
        assert_eq!(params["state"], "state-123");
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let router = Router::new().route(
            "/token",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                assert_eq!(form["grant_type"], "authorization_code");
                assert_eq!(form["code"], "4/abc");
                assert_eq!(form["redirect_uri"], "http://localhost:8080/callback");
                Json(serde_json::json!({
                    "access_token": "ya29.fresh",
                    "token_type": "Bearer",
                    "refresh_token": "1//refresh",
                    "expires_in": 3599
                }))
            }),
        );
        let client = OAuthClient::new(config(spawn_token_server(router).await)).unwrap();

        let token = client.exchange_code("4/abc").await.unwrap();
        assert_eq!(token.access_token, "ya29.fresh");
        assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let router = Router::new().route(
            "/token",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                assert_eq!(form["grant_type"], "refresh_token");
                assert_eq!(form["refresh_token"], "1//keep");
                Json(serde_json::json!({
                    "access_token": "ya29.second",
                    "expires_in": 3599
                }))
            }),
        );
        let client = OAuthClient::new(config(spawn_token_server(router).await)).unwrap();

        let mut old = OAuthToken::new("ya29.first");
        old.refresh_token = Some("1//keep".to_string());
        let fresh = client.refresh(&old).await.unwrap();
        assert_eq!(fresh.access_token, "ya29.second");
        assert_eq!(fresh.refresh_token.as_deref(), Some("1//keep"));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let client = OAuthClient::new(config(GOOGLE_TOKEN_URL.to_string())).unwrap();
        let result = client.refresh(&OAuthToken::new("ya29.old")).await;
        assert!(matches!(result, Err(Error::OAuth(_))));
    }

    #[tokio::test]
    async fn test_token_error_response() {
        let router = Router::new().route(
            "/token",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": "invalid_grant",
                        "error_description": "Bad Request"
                    })),
                )
            }),
        );
        let client = OAuthClient::new(config(spawn_token_server(router).await)).unwrap();

        match client.exchange_code("stale").await {
            Err(Error::OAuth(message)) => assert!(message.contains("invalid_grant")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
