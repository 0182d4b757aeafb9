use axum::http::Extensions;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{ctx::Bind, error::ApiError, users::repo_types::User};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

fn validate(user: &User) -> Result<(), ApiError> {
    require("email", &user.email)?;
    require("password", &user.password)?;
    require("firstName", &user.first_name)?;
    require("lastName", &user.last_name)?;
    if !is_valid_email(&user.email) {
        return Err(ApiError::bad_request("invalid email"));
    }
    Ok(())
}

/// Sign-up body. Any client-supplied id is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl Bind for UserRequest {
    type Target = User;

    fn bind(self, _extensions: &Extensions) -> Result<User, ApiError> {
        let user = User {
            id: 0,
            email: self.email.trim().to_lowercase(),
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            archived: false,
        };
        validate(&user)?;
        Ok(user)
    }
}

/// Update body; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserPatch {
    pub fn merge(self, current: &User) -> Result<User, ApiError> {
        let user = User {
            id: current.id,
            email: self
                .email
                .map(|e| e.trim().to_lowercase())
                .unwrap_or_else(|| current.email.clone()),
            password: self.password.unwrap_or_else(|| current.password.clone()),
            first_name: self.first_name.unwrap_or_else(|| current.first_name.clone()),
            last_name: self.last_name.unwrap_or_else(|| current.last_name.clone()),
            archived: false,
        };
        validate(&user)?;
        Ok(user)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub archived: bool,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            password: u.password,
            first_name: u.first_name,
            last_name: u.last_name,
            archived: u.archived,
        }
    }
}
