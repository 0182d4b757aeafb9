use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{
    auth::jwt::{JwtKeys, VerifyError},
    error::ApiError,
};

/// The principal: user id taken from a verified bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            warn!("missing Authorization header");
            return Err(ApiError::unauthorized());
        };

        let Some(token) = bearer_token(header) else {
            warn!("invalid Authorization header");
            return Err(ApiError::unauthorized());
        };

        match JwtKeys::from_ref(state).verify(token) {
            Ok(claims) => Ok(AuthUser(claims.id)),
            Err(VerifyError::Claims(e)) => {
                warn!(error = %e, "token claims rejected");
                Err(ApiError::bad_request("invalid token claims"))
            }
            Err(VerifyError::Invalid(e)) => {
                warn!(error = %e, "invalid token");
                Err(ApiError::unauthorized())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("BEARER abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
    }
}
