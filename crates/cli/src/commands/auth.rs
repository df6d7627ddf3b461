//! Account commands.
//!
//! Passwords are prompted for on the terminal unless passed as flags, and are
//! only held as [`SecretString`].

use freshmart_storefront::api::{Credentials, PasswordChange, SignupData};
use freshmart_storefront::storage::FileStorage;
use freshmart_storefront::stores::{AuthError, AuthStore};
use secrecy::SecretString;

use super::{Context, prompt_secret};

fn store(ctx: &Context) -> AuthStore<FileStorage> {
    AuthStore::new(ctx.api.clone())
}

/// Log in and keep the session in the session file.
///
/// # Errors
///
/// Returns the validation or server message when login fails.
#[allow(clippy::print_stdout)]
pub async fn login(
    ctx: &Context,
    email: &str,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = match password {
        Some(p) => SecretString::from(p),
        None => prompt_secret("Password")?,
    };
    let credentials = Credentials {
        email: email.trim().to_string(),
        password,
    };

    let user = store(ctx).login(&credentials).await?;
    println!("Welcome, {}", user.name);
    Ok(())
}

/// Create an account and keep the session.
///
/// # Errors
///
/// Returns the validation or server message when signup fails.
#[allow(clippy::print_stdout)]
pub async fn signup(
    ctx: &Context,
    name: String,
    email: String,
    phone: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = SignupData {
        name,
        email,
        password: prompt_secret("Password")?,
        re_password: prompt_secret("Confirm password")?,
        phone,
    };

    let user = store(ctx).signup(&data).await?;
    println!("Account created. Welcome, {}", user.name);
    Ok(())
}

/// Forget the session. A local wishlist is kept.
#[allow(clippy::print_stdout)]
pub async fn logout(ctx: &Context) {
    store(ctx).logout().await;
    println!("Logged out");
}

/// Show the logged-in user, if any.
#[allow(clippy::print_stdout)]
pub async fn whoami(ctx: &Context) {
    match store(ctx).current().await {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            if let Some(role) = user.role {
                println!("Role: {role}");
            }
        }
        None => println!("Not logged in"),
    }
}

/// Check the session token; a rejected token logs out.
///
/// # Errors
///
/// Returns an error when not logged in or the token is rejected.
#[allow(clippy::print_stdout)]
pub async fn verify(ctx: &Context) -> Result<(), AuthError> {
    let user = store(ctx).verify_token().await?;
    println!("Session valid for {}", user.email);
    Ok(())
}

/// Email a password reset code.
///
/// # Errors
///
/// Returns the validation or server message.
#[allow(clippy::print_stdout)]
pub async fn forgot_password(ctx: &Context, email: &str) -> Result<(), AuthError> {
    let message = store(ctx).forgot_password(email).await?;
    println!("{message}");
    Ok(())
}

/// Check an emailed reset code.
///
/// # Errors
///
/// Returns the validation or server message.
#[allow(clippy::print_stdout)]
pub async fn verify_reset_code(ctx: &Context, code: &str) -> Result<(), AuthError> {
    let message = store(ctx).verify_reset_code(code).await?;
    println!("{message}");
    Ok(())
}

/// Set a new password after the reset code was verified.
///
/// # Errors
///
/// Returns the validation or server message.
#[allow(clippy::print_stdout)]
pub async fn reset_password(ctx: &Context, email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let new_password = prompt_secret("New password")?;
    let message = store(ctx).reset_password(email, &new_password).await?;
    println!("{message} You can now log in.");
    Ok(())
}

/// Change the logged-in user's password.
///
/// # Errors
///
/// Returns an error when not logged in, or the validation or server message.
#[allow(clippy::print_stdout)]
pub async fn change_password(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let change = PasswordChange {
        current_password: prompt_secret("Current password")?,
        password: prompt_secret("New password")?,
        re_password: prompt_secret("Confirm new password")?,
    };
    let message = store(ctx).change_password(&change).await?;
    println!("{message}");
    Ok(())
}
