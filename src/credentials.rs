//! API-key resolution: secret store first, environment variable second.
//!
//! The secret store is a TOML file holding a top-level `MISTRAL_API_KEY`
//! string. Files are tried in this order:
//!
//! 1. the explicit path from [`crate::config::OcrConfig::secrets_path`]
//!    (an unreadable explicit file is an error: the user asked for it),
//! 2. `./.ocr2md/secrets.toml`,
//! 3. `<config dir>/ocr2md/secrets.toml` (e.g. `~/.config/ocr2md/` on Linux).
//!
//! Implicit files that are missing are skipped silently; implicit files that
//! exist but cannot be parsed are logged and skipped. Empty values count as
//! absent everywhere.

use crate::error::Ocr2MdError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the key, both in the secrets file and in the environment.
pub const API_KEY_NAME: &str = "MISTRAL_API_KEY";

/// Where a resolved key came from. Logged, never the key itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Passed directly by the caller.
    Explicit,
    SecretStore(PathBuf),
    Environment,
}

/// A resolved API key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    value: String,
    pub source: CredentialSource,
}

impl ApiKey {
    pub fn new(value: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// The implicit secret-store locations, in lookup order.
pub fn default_secret_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".ocr2md").join("secrets.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("ocr2md").join("secrets.toml"));
    }
    paths
}

/// Resolve the API key from the secret store, then the environment.
///
/// # Errors
/// [`Ocr2MdError::MissingCredential`] when no source yields a non-empty key;
/// [`Ocr2MdError::SecretStoreUnreadable`] when `explicit_store` is given but
/// cannot be read or parsed.
pub fn resolve_api_key(explicit_store: Option<&Path>) -> Result<ApiKey, Ocr2MdError> {
    resolve_with(explicit_store, &default_secret_paths(), |name| {
        std::env::var(name).ok()
    })
}

/// [`resolve_api_key`] with injectable search paths and environment lookup.
pub fn resolve_with(
    explicit_store: Option<&Path>,
    implicit_stores: &[PathBuf],
    env: impl Fn(&str) -> Option<String>,
) -> Result<ApiKey, Ocr2MdError> {
    if let Some(path) = explicit_store {
        match read_secret_file(path) {
            Ok(Some(key)) => return Ok(found_in_store(key, path)),
            Ok(None) => debug!("{} has no {API_KEY_NAME}", path.display()),
            Err(detail) => {
                return Err(Ocr2MdError::SecretStoreUnreadable {
                    path: path.to_path_buf(),
                    detail,
                })
            }
        }
    }

    for path in implicit_stores {
        if !path.exists() {
            continue;
        }
        match read_secret_file(path) {
            Ok(Some(key)) => return Ok(found_in_store(key, path)),
            Ok(None) => debug!("{} has no {API_KEY_NAME}", path.display()),
            Err(detail) => warn!("Ignoring secrets file {}: {detail}", path.display()),
        }
    }

    if let Some(key) = env(API_KEY_NAME).filter(|k| !k.trim().is_empty()) {
        debug!("Using {API_KEY_NAME} from the environment");
        return Ok(ApiKey::new(key.trim(), CredentialSource::Environment));
    }

    let mut searched: Vec<String> = explicit_store
        .into_iter()
        .chain(implicit_stores.iter().map(PathBuf::as_path))
        .map(|p| p.display().to_string())
        .collect();
    searched.push(format!("${API_KEY_NAME}"));

    Err(Ocr2MdError::MissingCredential {
        searched: searched.join(", "),
    })
}

fn found_in_store(key: String, path: &Path) -> ApiKey {
    debug!("Using {API_KEY_NAME} from {}", path.display());
    ApiKey::new(key, CredentialSource::SecretStore(path.to_path_buf()))
}

/// Read the key from one secrets file. `Ok(None)` when the file parses but
/// has no usable key.
fn read_secret_file(path: &Path) -> Result<Option<String>, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let table: toml::Table = content.parse().map_err(|e: toml::de::Error| e.to_string())?;
    Ok(table
        .get(API_KEY_NAME)
        .and_then(toml::Value::as_str)
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string))
}
