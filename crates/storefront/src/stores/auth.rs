//! Authentication store.
//!
//! Owns the persisted session: the raw token under `token` and the user as
//! JSON under `user`. Input is validated before any request is sent.

use freshmart_core::{Email, EmailError};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{Api, ApiError, AuthSession, Credentials, PasswordChange, SignupData, User};
use crate::storage::{KeyValueStore, StorageError, keys, load_json, save_json};

/// Errors from authentication actions.
///
/// `Display` is the message shown next to the form.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The email address is not well-formed.
    #[error("Please enter a valid email address")]
    InvalidEmail(#[from] EmailError),

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// The action needs a logged-in user.
    #[error("Please log in first")]
    NotLoggedIn,

    /// The API rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session could not be persisted.
    #[error("Could not save your session. Please try again.")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Whether the error was raised before any request was sent.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::InvalidEmail(_) | Self::PasswordMismatch
        )
    }
}

fn require(value: &str, field: &'static str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(())
}

fn require_secret(value: &SecretString, field: &'static str) -> Result<(), AuthError> {
    require(value.expose_secret(), field)
}

fn validate_login(credentials: &Credentials) -> Result<(), AuthError> {
    require(&credentials.email, "Email")?;
    require_secret(&credentials.password, "Password")
}

fn validate_signup(data: &SignupData) -> Result<(), AuthError> {
    require(&data.name, "Name")?;
    Email::parse(&data.email)?;
    require_secret(&data.password, "Password")?;
    require_secret(&data.re_password, "Password confirmation")?;
    if data.password.expose_secret() != data.re_password.expose_secret() {
        return Err(AuthError::PasswordMismatch);
    }
    require(&data.phone, "Phone")
}

// =============================================================================
// AuthStore
// =============================================================================

/// Session state for one visitor.
#[derive(Debug, Clone)]
pub struct AuthStore<S> {
    api: Api<S>,
}

impl<S: KeyValueStore> AuthStore<S> {
    #[must_use]
    pub const fn new(api: Api<S>) -> Self {
        Self { api }
    }

    /// Whether a token is persisted.
    pub async fn is_authenticated(&self) -> bool {
        self.api.token().await.is_some()
    }

    /// Restore the logged-in user from storage.
    ///
    /// Requires both a token and a well-formed user; anything else reads as
    /// logged out.
    pub async fn current(&self) -> Option<User> {
        self.api.token().await?;
        load_json(self.api.storage(), keys::USER).await
    }

    /// Log in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields (no request is sent), or
    /// the server's message for rejected credentials.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        validate_login(credentials)?;
        let session = self.api.sign_in(credentials).await?;
        self.persist(&session).await?;
        info!("Logged in");
        Ok(session.user)
    }

    /// Create an account and persist the session.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing or inconsistent fields (no
    /// request is sent), or the server's message when signup is rejected.
    #[instrument(skip_all, fields(email = %data.email))]
    pub async fn signup(&self, data: &SignupData) -> Result<User, AuthError> {
        validate_signup(data)?;
        let session = self.api.sign_up(data).await?;
        self.persist(&session).await?;
        info!("Account created");
        Ok(session.user)
    }

    /// Forget the persisted session.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.api.clear_session().await;
        info!("Logged out");
    }

    /// Check the persisted token with the API.
    ///
    /// On success, a stored user without an id gains the verified id. Any
    /// failure logs the visitor out.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotLoggedIn`] without a token, or the API error
    /// that caused the logout.
    #[instrument(skip(self))]
    pub async fn verify_token(&self) -> Result<User, AuthError> {
        let Some(mut user) = self.current().await else {
            return Err(AuthError::NotLoggedIn);
        };

        match self.api.verify_token().await {
            Ok(claims) => {
                if user.id.is_none() {
                    user.id = Some(claims.id);
                    save_json(self.api.storage(), keys::USER, &user).await?;
                }
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Token verification failed");
                self.logout().await;
                Err(e.into())
            }
        }
    }

    /// Request a password reset code by email.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email, or the server's message.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<String, AuthError> {
        let email = Email::parse(email)?;
        Ok(self.api.forgot_password(email.as_str()).await?)
    }

    /// Check an emailed reset code.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank code, or the server's message.
    #[instrument(skip_all)]
    pub async fn verify_reset_code(&self, code: &str) -> Result<String, AuthError> {
        require(code, "Reset code")?;
        Ok(self.api.verify_reset_code(code.trim()).await?)
    }

    /// Set a new password after the reset code was verified.
    ///
    /// The visitor still logs in afterwards; no session is persisted.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields, or the server's message.
    #[instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &SecretString,
    ) -> Result<String, AuthError> {
        let email = Email::parse(email)?;
        require_secret(new_password, "New password")?;
        self.api.reset_password(email.as_str(), new_password).await?;
        info!("Password reset");
        Ok("Password reset successfully!".to_string())
    }

    /// Change the logged-in user's password and keep the fresh token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotLoggedIn`] without a session, a validation
    /// error for blank or mismatched fields, or the server's message.
    #[instrument(skip_all)]
    pub async fn change_password(&self, change: &PasswordChange) -> Result<String, AuthError> {
        if self.current().await.is_none() {
            return Err(AuthError::NotLoggedIn);
        }
        require_secret(&change.current_password, "Current password")?;
        require_secret(&change.password, "New password")?;
        if change.password.expose_secret() != change.re_password.expose_secret() {
            return Err(AuthError::PasswordMismatch);
        }

        let token = self.api.change_password(change).await?;
        self.api
            .storage()
            .set(keys::TOKEN, token.expose_secret())
            .await?;
        info!("Password changed");
        Ok("Password changed successfully!".to_string())
    }

    async fn persist(&self, session: &AuthSession) -> Result<(), AuthError> {
        let storage = self.api.storage();
        storage
            .set(keys::TOKEN, session.token.expose_secret())
            .await?;
        save_json(storage, keys::USER, &session.user).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::ApiConfig;
    use crate::storage::MemoryStorage;

    // Nothing listens on port 9; any request that slips past validation fails.
    fn store() -> (AuthStore<MemoryStorage>, MemoryStorage) {
        let client = ApiClient::new(&ApiConfig::with_base_url("http://127.0.0.1:9")).unwrap();
        let storage = MemoryStorage::new();
        (AuthStore::new(Api::new(client, storage.clone())), storage)
    }

    fn signup_data() -> SignupData {
        SignupData {
            name: "Mona".to_string(),
            email: "mona@example.com".to_string(),
            password: SecretString::from("secret123"),
            re_password: SecretString::from("secret123"),
            phone: "01012345678".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_blank_password_is_rejected_locally() {
        let (auth, _) = store();
        let err = auth
            .login(&Credentials {
                email: "mona@example.com".to_string(),
                password: SecretString::from(""),
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Password is required");
    }

    #[tokio::test]
    async fn test_signup_password_mismatch() {
        let (auth, _) = store();
        let data = SignupData {
            re_password: SecretString::from("other"),
            ..signup_data()
        };
        let err = auth.signup(&data).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
    }

    #[tokio::test]
    async fn test_signup_malformed_email() {
        let (auth, _) = store();
        let data = SignupData {
            email: "not-an-email".to_string(),
            ..signup_data()
        };
        let err = auth.signup(&data).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn test_signup_missing_phone() {
        let (auth, _) = store();
        let data = SignupData {
            phone: "  ".to_string(),
            ..signup_data()
        };
        assert_eq!(
            auth.signup(&data).await.unwrap_err().to_string(),
            "Phone is required"
        );
    }

    #[tokio::test]
    async fn test_current_requires_token_and_valid_user() {
        let (auth, storage) = store();
        storage
            .set(keys::USER, r#"{"name":"Mona","email":"mona@example.com"}"#)
            .await
            .unwrap();
        assert!(auth.current().await.is_none());

        storage.set(keys::TOKEN, "abc").await.unwrap();
        assert_eq!(auth.current().await.unwrap().name, "Mona");

        storage.set(keys::USER, "{broken").await.unwrap();
        assert!(auth.current().await.is_none());
        assert!(auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_logout_removes_session_keys() {
        let (auth, storage) = store();
        storage.set(keys::TOKEN, "abc").await.unwrap();
        storage.set(keys::USER, "{}").await.unwrap();
        storage.set(keys::WISHLIST, "[]").await.unwrap();

        auth.logout().await;

        assert!(!storage.contains(keys::TOKEN));
        assert!(!storage.contains(keys::USER));
        assert!(storage.contains(keys::WISHLIST));
        assert!(!auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_change_password_requires_session() {
        let (auth, _) = store();
        let err = auth
            .change_password(&PasswordChange {
                current_password: SecretString::from("a"),
                password: SecretString::from("b"),
                re_password: SecretString::from("b"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotLoggedIn));
    }
}
