use async_trait::async_trait;
use serde_json::json;

use super::{send, send_for, RestBackend, TokenResponse};
use crate::gateway::{GatewayFailure, GatewayResult, Profile, Registration, SessionGateway};

#[async_trait]
impl SessionGateway for RestBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &Profile,
    ) -> GatewayResult<Registration> {
        let request = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.api_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": {
                    "first_name": profile.first_name,
                    "last_name": profile.last_name,
                }
            }));

        let body: serde_json::Value = send_for(request).await?;

        // With mandatory email confirmation the service answers with the bare
        // user record and no tokens.
        if body.get("access_token").is_none() {
            tracing::debug!("Sign-up accepted, awaiting email confirmation");
            return Ok(Registration {
                session_active: false,
            });
        }

        let tokens: TokenResponse =
            serde_json::from_value(body).map_err(|e| GatewayFailure::new(e.to_string()))?;
        self.set_session(Some(tokens.into_session())).await;
        tracing::debug!("Sign-up issued a live session");
        Ok(Registration {
            session_active: true,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<()> {
        let request = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }));

        let tokens: TokenResponse = send_for(request).await?;
        let mut session = tokens.into_session();
        if session.email.is_none() {
            session.email = Some(email.to_string());
        }
        self.set_session(Some(session)).await;
        Ok(())
    }

    async fn sign_out(&self) {
        let current = self.session.lock().await.clone();
        if let Some(session) = current {
            let request = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.api_key)
                .bearer_auth(&session.access_token);
            if let Err(e) = send(request).await {
                tracing::warn!("Remote sign-out failed: {}", e);
            }
        }
        self.set_session(None).await;
    }

    async fn has_session(&self) -> bool {
        self.session.lock().await.is_some()
    }
}
