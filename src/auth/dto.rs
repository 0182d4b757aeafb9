use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Login body.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl CredentialsRequest {
    pub fn validate(mut self) -> Result<Self, ApiError> {
        self.email = self.email.trim().to_lowercase();
        if self.email.is_empty() {
            return Err(ApiError::bad_request("email is required"));
        }
        if self.password.is_empty() {
            return Err(ApiError::bad_request("password is required"));
        }
        Ok(self)
    }
}

/// Response returned after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
