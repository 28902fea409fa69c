//! Authentication collaborator seam.
//!
//! The token mechanics themselves (OAuth flows, identity providers) live
//! outside this crate. Bootstrap asks an [`Authenticator`] for a
//! [`TokenSource`], calls [`TokenSource::authenticate`] once, and afterwards
//! only reads tokens from it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::AuthError;

/// Credentials for the fleet service's identity provider.
#[derive(Clone)]
pub struct AuthConfig {
    pub app_client_id: String,
    pub app_client_secret: SecretString,
    pub username: String,
    pub password: SecretString,
    pub region: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("app_client_id", &self.app_client_id)
            .field("app_client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("region", &self.region)
            .finish()
    }
}

/// Source of bearer tokens for fleet-service calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Authenticate now, failing if the credentials are rejected.
    async fn authenticate(&self) -> Result<(), AuthError>;

    /// Current access token.
    async fn token(&self) -> Result<SecretString, AuthError>;
}

/// Builds token sources from credentials.
pub trait Authenticator: Send + Sync {
    fn token_source(&self, config: &AuthConfig) -> Result<Arc<dyn TokenSource>, AuthError>;
}

/// A pre-issued token that never expires from this crate's point of view.
pub struct StaticTokenSource {
    token: SecretString,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

impl fmt::Debug for StaticTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StaticTokenSource([REDACTED, {} bytes])",
            self.token.expose_secret().len()
        )
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn authenticate(&self) -> Result<(), AuthError> {
        if self.token.expose_secret().is_empty() {
            return Err(AuthError::TokenUnavailable("static token is empty".to_string()));
        }
        Ok(())
    }

    async fn token(&self) -> Result<SecretString, AuthError> {
        Ok(SecretString::from(self.token.expose_secret().to_string()))
    }
}
