//! Authentication endpoints.
//!
//! These calls only talk to the API; persisting the resulting session is the
//! job of [`AuthStore`](crate::stores::AuthStore).

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::instrument;

use crate::storage::KeyValueStore;

use super::conversions::{convert_claims, convert_user};
use super::types::{AuthSession, Credentials, PasswordChange, SignupData, TokenClaims};
use super::wire::{RawAuthResponse, RawMessage, RawTokenResponse, RawVerifyResponse};
use super::{Api, ApiError};

/// A decode error for a success response missing a required field.
pub(super) fn missing_field(field: &str) -> ApiError {
    ApiError::Decode(serde::de::Error::custom(format!(
        "missing field `{field}`"
    )))
}

fn session_from(raw: RawAuthResponse) -> Result<AuthSession, ApiError> {
    let token = raw
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| missing_field("token"))?;
    let user = raw.user.map(convert_user).ok_or_else(|| missing_field("user"))?;
    Ok(AuthSession {
        token: SecretString::from(token),
        user,
    })
}

fn message_or(raw: RawMessage, fallback: &str) -> String {
    raw.message
        .or(raw.status_msg)
        .or(raw.status)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

impl<S: KeyValueStore> Api<S> {
    /// `POST /auth/signin`.
    ///
    /// # Errors
    ///
    /// Returns the server's message on rejected credentials.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        });
        let raw: RawAuthResponse = self.send_json(Method::POST, "/auth/signin", body).await?;
        session_from(raw)
    }

    /// `POST /auth/signup`.
    ///
    /// # Errors
    ///
    /// Returns the server's message when the account cannot be created
    /// (for example, the email is already registered).
    #[instrument(skip_all, fields(email = %data.email))]
    pub async fn sign_up(&self, data: &SignupData) -> Result<AuthSession, ApiError> {
        let body = json!({
            "name": data.name,
            "email": data.email,
            "password": data.password.expose_secret(),
            "rePassword": data.re_password.expose_secret(),
            "phone": data.phone,
        });
        let raw: RawAuthResponse = self.send_json(Method::POST, "/auth/signup", body).await?;
        session_from(raw)
    }

    /// `GET /auth/verifyToken` with the persisted token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for an invalid or expired token.
    #[instrument(skip(self))]
    pub async fn verify_token(&self) -> Result<TokenClaims, ApiError> {
        let raw: RawVerifyResponse = self.get("/auth/verifyToken").await?;
        raw.decoded
            .and_then(convert_claims)
            .ok_or_else(|| missing_field("decoded"))
    }

    /// `POST /auth/forgotPasswords`: email a reset code.
    ///
    /// # Errors
    ///
    /// Returns the server's message when the email is unknown.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        let raw: RawMessage = self
            .send_json(
                Method::POST,
                "/auth/forgotPasswords",
                json!({ "email": email }),
            )
            .await?;
        Ok(message_or(raw, "Reset code sent to your email"))
    }

    /// `POST /auth/verifyResetCode`.
    ///
    /// # Errors
    ///
    /// Returns the server's message for an invalid or expired code.
    #[instrument(skip_all)]
    pub async fn verify_reset_code(&self, code: &str) -> Result<String, ApiError> {
        let raw: RawMessage = self
            .send_json(
                Method::POST,
                "/auth/verifyResetCode",
                json!({ "resetCode": code }),
            )
            .await?;
        Ok(message_or(raw, "Reset code verified"))
    }

    /// `PUT /auth/resetPassword`. Returns the fresh token.
    ///
    /// # Errors
    ///
    /// Returns the server's message when the reset is rejected.
    #[instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &SecretString,
    ) -> Result<SecretString, ApiError> {
        let body = json!({
            "email": email,
            "newPassword": new_password.expose_secret(),
        });
        let raw: RawTokenResponse = self
            .send_json(Method::PUT, "/auth/resetPassword", body)
            .await?;
        raw.token
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| missing_field("token"))
    }

    /// `PUT /users/changeMyPassword` for the logged-in user. Returns the fresh token.
    ///
    /// # Errors
    ///
    /// Returns the server's message when the current password is wrong.
    #[instrument(skip_all)]
    pub async fn change_password(&self, change: &PasswordChange) -> Result<SecretString, ApiError> {
        let body = json!({
            "currentPassword": change.current_password.expose_secret(),
            "password": change.password.expose_secret(),
            "rePassword": change.re_password.expose_secret(),
        });
        let raw: RawTokenResponse = self
            .send_json(Method::PUT, "/users/changeMyPassword", body)
            .await?;
        raw.token
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| missing_field("token"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_requires_token() {
        let raw: RawAuthResponse = serde_json::from_str(
            r#"{"message":"success","user":{"name":"A","email":"a@b.c"}}"#,
        )
        .unwrap();
        assert!(matches!(session_from(raw), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_session_from_success() {
        let raw: RawAuthResponse = serde_json::from_str(
            r#"{"message":"success","user":{"name":"A","email":"a@b.c","role":"user"},"token":"t"}"#,
        )
        .unwrap();
        let session = session_from(raw).unwrap();
        assert_eq!(session.token.expose_secret(), "t");
        assert_eq!(session.user.email, "a@b.c");
    }

    #[test]
    fn test_message_or_fallback() {
        assert_eq!(message_or(RawMessage::default(), "fallback"), "fallback");
        let raw = RawMessage {
            status: Some("Success".to_string()),
            ..RawMessage::default()
        };
        assert_eq!(message_or(raw, "fallback"), "Success");
    }
}
