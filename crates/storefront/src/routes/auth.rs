//! Authentication route handlers.
//!
//! Login and signup go through [`AuthStore`], which validates the form before
//! calling the commerce API and persists the session under the `token` and
//! `user` keys.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::PageContext;
use crate::api::{Credentials, SignupData, User};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;
use crate::stores::{AuthError, AuthStore};

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Signup form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub re_password: String,
    pub phone: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub email: String,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Rotate the session id once the visitor's privileges change.
async fn rotate_session(session: &Session) {
    if let Err(e) = session.cycle_id().await {
        tracing::warn!("Failed to rotate session id: {}", e);
    }
}

fn signed_in(user: &User) -> Response {
    set_sentry_user(user.id.as_ref().map(|id| id.as_str()), &user.email);
    Redirect::to("/").into_response()
}

fn form_error(error: &AuthError) -> String {
    if !error.is_validation() {
        tracing::warn!(error = %error, "Authentication failed");
    }
    error.to_string()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Logged-in visitors go home.
pub async fn login_page(OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        page: PageContext::new("Login", None),
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    rotate_session(&session).await;
    let credentials = Credentials {
        email: form.email.trim().to_string(),
        password: SecretString::from(form.password),
    };

    match AuthStore::new(state.api(session)).login(&credentials).await {
        Ok(user) => signed_in(&user),
        Err(e) => LoginTemplate {
            page: PageContext::new("Login", None),
            error: Some(form_error(&e)),
            email: credentials.email,
        }
        .into_response(),
    }
}

// =============================================================================
// Signup Routes
// =============================================================================

/// Display the signup page. Logged-in visitors go home.
pub async fn signup_page(OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    SignupTemplate {
        page: PageContext::new("Sign Up", None),
        error: None,
        name: String::new(),
        email: String::new(),
        phone: String::new(),
    }
    .into_response()
}

/// Handle signup form submission.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    rotate_session(&session).await;
    let data = SignupData {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        password: SecretString::from(form.password),
        re_password: SecretString::from(form.re_password),
        phone: form.phone.trim().to_string(),
    };

    match AuthStore::new(state.api(session)).signup(&data).await {
        Ok(user) => signed_in(&user),
        Err(e) => SignupTemplate {
            page: PageContext::new("Sign Up", None),
            error: Some(form_error(&e)),
            name: data.name,
            email: data.email,
            phone: data.phone,
        }
        .into_response(),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Removes the token and user only; a local wishlist stays with the session.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    AuthStore::new(state.api(session)).logout().await;
    clear_sentry_user();
    Redirect::to("/").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_page_keeps_email_and_error() {
        let html = LoginTemplate {
            page: PageContext::new("Login", None),
            error: Some("Incorrect email or password".to_string()),
            email: "mona@example.com".to_string(),
        }
        .render()
        .unwrap();
        assert!(html.contains("Incorrect email or password"));
        assert!(html.contains("value=\"mona@example.com\""));
    }

    #[test]
    fn test_form_error_message() {
        assert_eq!(
            form_error(&AuthError::MissingField("Phone")),
            "Phone is required"
        );
        assert_eq!(form_error(&AuthError::PasswordMismatch), "Passwords do not match");
    }
}
