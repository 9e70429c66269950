use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Optional header naming the acting user; defaults to "api" so single-key
/// deployments still get a stable identity for ownership and echo
/// suppression.
pub const USER_HEADER: &str = "x-recap-user";

/// Single shared-secret authenticator.
pub struct ApiKeyAuthenticator {
    key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(key: String) -> Self {
        Self { key }
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let presented = request
            .headers
            .get(API_KEY_HEADER)
            .ok_or(AuthError::NotAuthenticated)?;

        if presented != &self.key {
            return Err(AuthError::InvalidCredentials("api key mismatch".to_string()));
        }

        let user = request
            .headers
            .get(USER_HEADER)
            .map(String::as_str)
            .unwrap_or("api");

        Ok(Identity::new(user, "api_key"))
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}
