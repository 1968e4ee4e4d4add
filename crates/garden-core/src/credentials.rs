//! Bearer credential providers.
//!
//! The HTTP client asks its [`TokenProvider`] for the current token before
//! every outbound request, so a token rotated on disk (or elsewhere) is
//! picked up without rebuilding the client.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::CredentialError;

/// Source of the bearer token attached to outbound requests.
///
/// Returning `Ok(None)` sends the request without an `Authorization` header.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Resolve the token to use for the next request.
    async fn current_token(&self) -> Result<Option<String>, CredentialError>;
}

/// Sends requests unauthenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

#[async_trait]
impl TokenProvider for NoToken {
    async fn current_token(&self) -> Result<Option<String>, CredentialError> {
        Ok(None)
    }
}

/// A fixed token, e.g. from an environment variable.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticToken").field(&"<redacted>").finish()
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn current_token(&self) -> Result<Option<String>, CredentialError> {
        Ok(Some(self.0.clone()))
    }
}

/// A token stored in a file, re-read on every request.
///
/// Surrounding whitespace is trimmed; an empty or missing file yields no
/// token rather than an error, matching a signed-out session.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    /// Read tokens from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the token file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenProvider for TokenFile {
    async fn current_token(&self) -> Result<Option<String>, CredentialError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Token file {} not found, sending unauthenticated", self.path.display());
                Ok(None)
            }
            Err(e) => Err(CredentialError::Unreadable {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }
}
