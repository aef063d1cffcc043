//! Gateways for a hosted backend exposing an identity API under `/auth/v1`
//! and table access under `/rest/v1`.

mod auth;
mod notes;
pub mod session_file;

use std::path::PathBuf;

use chrono::{Duration, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;

use super::{GatewayFailure, GatewayResult};
use crate::config::ClientConfig;
use crate::error::Result;
use session_file::StoredSession;

/// Both gateways over one HTTP client and one session.
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    session: Mutex<Option<StoredSession>>,
    session_path: Option<PathBuf>,
}

/// Token payload returned by sign-in, refresh, and sign-up when the
/// service issues a session immediately.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    user: Option<UserResponse>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> StoredSession {
        StoredSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            email: self.user.and_then(|u| u.email),
        }
    }
}

impl RestBackend {
    /// Build the backend. When `session_path` is given, a session saved
    /// there by an earlier run is restored.
    pub fn new(config: &ClientConfig, session_path: Option<PathBuf>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let restored = session_path.as_deref().and_then(session_file::load);
        if restored.is_some() {
            tracing::debug!("Restored saved session");
        }

        Ok(Self {
            http,
            base_url: config.service_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            table: config.notes_table.clone(),
            session: Mutex::new(restored),
            session_path,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Email of the signed-in user, if the service reported one.
    pub async fn session_email(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .and_then(|s| s.email.clone())
    }

    async fn set_session(&self, session: Option<StoredSession>) {
        if let Some(path) = &self.session_path {
            let persisted = match &session {
                Some(s) => session_file::save(path, s),
                None => session_file::remove(path),
            };
            if let Err(e) = persisted {
                tracing::warn!("Could not update session file {}: {}", path.display(), e);
            }
        }
        *self.session.lock().await = session;
    }

    /// A usable access token, refreshing an expired one first.
    async fn access_token(&self) -> GatewayResult<String> {
        let current = self.session.lock().await.clone();
        let session = current.ok_or_else(|| GatewayFailure::new("Not authenticated"))?;
        if !session.is_expired(Utc::now()) {
            return Ok(session.access_token);
        }

        tracing::debug!("Access token expired, refreshing");
        let request = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "refresh_token": session.refresh_token }));

        match send_for::<TokenResponse>(request).await {
            Ok(tokens) => {
                let mut refreshed = tokens.into_session();
                if refreshed.email.is_none() {
                    refreshed.email = session.email;
                }
                let token = refreshed.access_token.clone();
                self.set_session(Some(refreshed)).await;
                Ok(token)
            }
            Err(e) => {
                tracing::warn!("Session refresh failed: {}", e);
                self.set_session(None).await;
                Err(GatewayFailure::new("Session expired. Please sign in again."))
            }
        }
    }

    /// Attach the API key and the user's bearer token.
    async fn authorized(&self, request: RequestBuilder) -> GatewayResult<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(request.header("apikey", &self.api_key).bearer_auth(token))
    }
}

/// Send a request and require a 2xx status.
async fn send(request: RequestBuilder) -> GatewayResult<Response> {
    let response = request.send().await?;
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(failure_from_response(response).await)
    }
}

/// Send a request and decode a JSON body.
async fn send_for<T: serde::de::DeserializeOwned>(request: RequestBuilder) -> GatewayResult<T> {
    let response = send(request).await?;
    Ok(response.json::<T>().await?)
}

async fn failure_from_response(response: Response) -> GatewayFailure {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    GatewayFailure::new(error_message(status, &body))
}

/// Pick the human-readable message out of an error body.
///
/// The identity API uses `msg` or `error_description`, the table API uses
/// `message`.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(serde_json::Value::String(s)) = map.get(key) {
                if !s.trim().is_empty() {
                    return s.clone();
                }
            }
        }
    }
    format!("Request failed with status {}", status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_msg() {
        let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "Invalid login credentials"
        );
    }

    #[test]
    fn test_error_message_table_api() {
        let body = r#"{"code":"42501","details":null,"hint":null,"message":"permission denied for table notes"}"#;
        assert_eq!(
            error_message(StatusCode::FORBIDDEN, body),
            "permission denied for table notes"
        );
    }

    #[test]
    fn test_error_message_oauth_style() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "Invalid Refresh Token"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            "Request failed with status 502 Bad Gateway"
        );
    }

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let config = ClientConfig::new("https://abc.example.co/", "anon");
        let backend = RestBackend::new(&config, None).unwrap();
        assert_eq!(
            backend.auth_url("signup"),
            "https://abc.example.co/auth/v1/signup"
        );
        assert_eq!(backend.table_url(), "https://abc.example.co/rest/v1/notes");
    }
}
