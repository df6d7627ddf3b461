//! Checkout route handlers.
//!
//! Collects shipping details and confirms the order. The commerce API has no
//! order endpoint in use here, so nothing is charged or submitted upstream.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use freshmart_core::Email;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use super::PageContext;
use super::cart::{CartView, load_cart};
use crate::api::User;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Message shown once the order is accepted.
pub const ORDER_PLACED: &str = "Order placed successfully!";

/// Shipping form data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl CheckoutForm {
    /// Every problem with the form, in field order.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let required = [
            ("First name", &self.first_name),
            ("Last name", &self.last_name),
            ("Email", &self.email),
            ("Address", &self.address),
            ("City", &self.city),
            ("State", &self.state),
            ("ZIP code", &self.zip),
        ];

        let mut errors: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| format!("{label} is required"))
            .collect();

        if !self.email.trim().is_empty() && Email::parse(self.email.trim()).is_err() {
            errors.push("Please enter a valid email address".to_string());
        }
        errors
    }

    /// A form pre-filled from the logged-in user.
    fn for_user(user: Option<&User>) -> Self {
        let Some(user) = user else {
            return Self::default();
        };
        let mut names = user.name.splitn(2, ' ');
        Self {
            first_name: names.next().unwrap_or_default().to_string(),
            last_name: names.next().unwrap_or_default().to_string(),
            email: user.email.clone(),
            ..Self::default()
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub form: CheckoutForm,
    pub errors: Vec<String>,
    pub confirmation: Option<&'static str>,
    /// The visitor's cart, when logged in.
    pub summary: Option<CartView>,
}

async fn order_summary(state: &AppState, session: Session, user: Option<&User>) -> Option<CartView> {
    user?;
    let store = load_cart(state, session).await;
    Some(CartView::new(store.cart(), state.client()))
}

/// Display the checkout form.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let summary = order_summary(&state, session, user.as_ref()).await;
    CheckoutTemplate {
        form: CheckoutForm::for_user(user.as_ref()),
        page: PageContext::new("Checkout", user),
        errors: Vec::new(),
        confirmation: None,
        summary,
    }
}

/// Validate the form and confirm the order.
#[instrument(skip(state, session, user, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> impl IntoResponse {
    let errors = form.validate();
    let confirmation = errors.is_empty().then_some(ORDER_PLACED);
    if confirmation.is_some() {
        info!("Order confirmed");
    }

    let summary = order_summary(&state, session, user.as_ref()).await;
    CheckoutTemplate {
        page: PageContext::new("Checkout", user),
        form,
        errors,
        confirmation,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> CheckoutForm {
        CheckoutForm {
            first_name: "Mona".to_string(),
            last_name: "Adel".to_string(),
            email: "mona@example.com".to_string(),
            address: "12 Nile St".to_string(),
            city: "Cairo".to_string(),
            state: "Cairo".to_string(),
            zip: "11511".to_string(),
        }
    }

    #[test]
    fn test_complete_form_is_valid() {
        assert!(filled().validate().is_empty());
    }

    #[test]
    fn test_every_field_is_required() {
        let errors = CheckoutForm::default().validate();
        assert_eq!(errors.len(), 7);
        assert_eq!(errors.first().map(String::as_str), Some("First name is required"));
    }

    #[test]
    fn test_malformed_email_is_rejected() {
        let form = CheckoutForm {
            email: "not-an-email".to_string(),
            ..filled()
        };
        assert_eq!(form.validate(), vec!["Please enter a valid email address"]);
    }

    #[test]
    fn test_prefill_splits_name() {
        let user = User {
            id: None,
            name: "Mona Adel Hassan".to_string(),
            email: "mona@example.com".to_string(),
            role: None,
        };
        let form = CheckoutForm::for_user(Some(&user));
        assert_eq!(form.first_name, "Mona");
        assert_eq!(form.last_name, "Adel Hassan");
        assert!(form.address.is_empty());
    }
}
