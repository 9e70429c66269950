//! Authorization collaborator, kept at its interface boundary.
//!
//! The core trusts that project access has been confirmed before any
//! operation runs; this module only establishes who the requester is.

mod api_key;
mod none;
mod types;

pub use api_key::ApiKeyAuthenticator;
pub use none::NoneAuthenticator;
pub use types::{AuthRequest, Identity};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AuthConfig, AuthMethod};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate a request and return the requester's identity.
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Name of this authentication method.
    fn method_name(&self) -> &'static str;
}

/// Build the authenticator configured in the auth section.
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::ApiKey => {
            let key = config.api_key.clone().ok_or_else(|| {
                AuthError::ConfigurationError("api_key method requires auth.api_key".to_string())
            })?;
            Ok(Box::new(ApiKeyAuthenticator::new(key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_none_authenticator() {
        let auth = create_authenticator(&AuthConfig {
            method: AuthMethod::None,
            api_key: None,
        })
        .unwrap();
        assert_eq!(auth.method_name(), "none");
    }

    #[test]
    fn test_create_api_key_requires_key() {
        let result = create_authenticator(&AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: None,
        });
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));

        let auth = create_authenticator(&AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: Some("k".to_string()),
        })
        .unwrap();
        assert_eq!(auth.method_name(), "api_key");
    }
}
