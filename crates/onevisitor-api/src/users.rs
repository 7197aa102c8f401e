// User and session endpoints (`/users/...`).
//
// Login and refresh bypass the 401 retry path: a 401 there means the
// credentials themselves are bad. Bodies on these endpoints are snake_case.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, warn};

use crate::client::{ApiClient, handle_empty, handle_response};
use crate::error::Error;
use crate::types::{AuthResponse, RefreshResponse, UserDto};

impl ApiClient {
    /// Log in with email/password and store the returned token pair.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<UserDto, Error> {
        let url = self.url("users/login/")?;
        debug!("logging in at {url}");

        let resp = self
            .http()
            .post(url)
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let auth: AuthResponse = handle_response(&Method::POST, resp).await?;
        self.tokens().set_access_token(auth.token.into())?;
        self.tokens().set_refresh_token(auth.refresh_token.into())?;

        debug!("login successful");
        Ok(auth.user)
    }

    /// End the session server-side, then forget local tokens regardless.
    pub async fn logout(&self) -> Result<(), Error> {
        let result = self.post_no_response("users/logout/", &json!({})).await;
        self.tokens().clear()?;
        debug!("logout complete");
        result
    }

    /// Exchange the stored refresh token for a new access token.
    pub async fn refresh_access_token(&self) -> Result<(), Error> {
        let refresh = self.tokens().refresh_token().ok_or(Error::NoRefreshToken)?;
        let url = self.url("users/refresh-token/")?;
        debug!("POST {url}");

        let resp = self
            .http()
            .post(url)
            .json(&json!({ "refresh_token": refresh.expose_secret() }))
            .send()
            .await?;

        if !resp.status().is_success() {
            warn!(status = resp.status().as_u16(), "token refresh rejected");
            return Err(Error::SessionExpired);
        }

        let body: RefreshResponse = handle_response(&Method::POST, resp).await?;
        self.tokens().set_access_token(body.token.into())?;
        Ok(())
    }

    pub async fn profile(&self) -> Result<UserDto, Error> {
        self.get("users/profile/").await
    }

    pub async fn change_password(
        &self,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), Error> {
        self.post_no_response(
            "users/change-password/",
            &json!({
                "old_password": old_password.expose_secret(),
                "new_password": new_password.expose_secret(),
            }),
        )
        .await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), Error> {
        let url = self.url("users/request-password-reset/")?;
        debug!("POST {url}");
        let resp = self
            .http()
            .post(url)
            .json(&json!({ "email": email }))
            .send()
            .await?;
        handle_empty(&Method::POST, resp).await
    }
}
