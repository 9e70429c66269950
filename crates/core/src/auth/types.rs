use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request information available to authenticators.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Lower-cased header names to values.
    pub headers: HashMap<String, String>,
}

impl AuthRequest {
    pub fn from_headers(headers: HashMap<String, String>) -> Self {
        Self { headers }
    }
}

/// Authenticated identity of a requester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub method: String,
}

impl Identity {
    pub fn new(user_id: &str, method: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            method: method.to_string(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous", "none")
    }
}
