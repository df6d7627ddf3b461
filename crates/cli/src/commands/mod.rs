//! Command implementations.
//!
//! Every command builds its store from one [`Context`]: the shared API client
//! bound to the session file, so a login in one invocation is seen by the next.

use std::io::BufRead;
use std::path::PathBuf;

use freshmart_storefront::api::{Api, ApiClient};
use freshmart_storefront::config::{ApiConfig, CatalogConfig};
use freshmart_storefront::storage::FileStorage;
use secrecy::SecretString;
use thiserror::Error;

pub mod auth;
pub mod brands;
pub mod cart;
pub mod products;
pub mod wishlist;

/// Errors setting up a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Neither `--storage`, `FRESHMART_STORAGE` nor `HOME` is available.
    #[error("No session file location: set FRESHMART_STORAGE or HOME")]
    NoStoragePath,

    /// Reading from the terminal failed.
    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),

    /// Input ended before a value was entered.
    #[error("No {0} entered")]
    EmptyInput(&'static str),

    /// The sort key is not supported.
    #[error(transparent)]
    Sort(#[from] freshmart_core::UnknownSortKey),
}

/// Everything a command needs.
pub struct Context {
    pub api: Api<FileStorage>,
    pub catalog: CatalogConfig,
}

impl Context {
    /// Load configuration and open the session file.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid environment variables, a missing session
    /// file location, or an HTTP client that cannot be built.
    pub fn from_env(storage: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let api_config = ApiConfig::from_env()?;
        let catalog = CatalogConfig::from_env()?;
        let path = storage
            .or_else(storage_path)
            .ok_or(CommandError::NoStoragePath)?;
        tracing::debug!(path = %path.display(), "Using session file");

        let client = ApiClient::new(&api_config)?;
        Ok(Self {
            api: Api::new(client, FileStorage::new(path)),
            catalog,
        })
    }
}

/// `FRESHMART_STORAGE`, else `$HOME/.freshmart/storage.json`.
fn storage_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("FRESHMART_STORAGE").filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".freshmart").join("storage.json"))
}

/// Ask for a value on stderr and read one line from stdin.
#[allow(clippy::print_stderr)]
pub fn prompt(label: &'static str) -> Result<String, CommandError> {
    eprint!("{label}: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        return Err(CommandError::EmptyInput(label));
    }
    Ok(value)
}

/// [`prompt`] for a password.
pub fn prompt_secret(label: &'static str) -> Result<SecretString, CommandError> {
    prompt(label).map(SecretString::from)
}
