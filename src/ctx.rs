//! Request-scoped context: typed values resolved by middleware and read
//! back by later stages without re-fetching.

use std::collections::HashMap;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, Extensions},
    middleware::Next,
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::error::ApiError;

const BODY_LIMIT: usize = 1024 * 1024;

/// A value attached to the current request by a context middleware.
///
/// Used both to store (`Ctx(user)` in the extensions) and to read
/// (`Ctx(user): Ctx<User>` as an extractor).
#[derive(Debug, Clone)]
pub struct Ctx<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Ctx<T>
where
    T: Clone + Send + Sync + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Ctx<T>>().cloned().ok_or_else(|| {
            // a handler was mounted without the middleware that feeds it
            error!(kind = std::any::type_name::<T>(), "missing request context");
            ApiError::internal_msg("missing request context")
        })
    }
}

/// Look up a value placed in the extensions by an earlier stage.
pub fn ctx_value<T: Clone + Send + Sync + 'static>(extensions: &Extensions) -> Option<T> {
    extensions.get::<Ctx<T>>().map(|c| c.0.clone())
}

/// Reads a numeric identifier out of the matched path parameters.
pub fn path_id(params: &HashMap<String, String>, name: &str) -> Result<i64, ApiError> {
    let raw = params.get(name).map(|s| s.trim()).unwrap_or_default();
    if raw.is_empty() {
        warn!(param = name, "empty path parameter");
        return Err(ApiError::bad_request(format!("parameter {name} must be supplied")));
    }
    raw.parse::<i64>().map_err(|_| {
        warn!(param = name, value = raw, "non-numeric path parameter");
        ApiError::bad_request("unable to parse parameter id")
    })
}

/// A wire payload that turns into a domain entity.
///
/// `bind` runs after JSON decoding and may consult values attached by
/// earlier middleware (e.g. the owning user).
pub trait Bind: DeserializeOwned + Send + 'static {
    type Target: Clone + Send + Sync + 'static;

    fn bind(self, extensions: &Extensions) -> Result<Self::Target, ApiError>;
}

/// Body-bound context middleware: decode the body as `B`, bind it and
/// attach the resulting entity as `Ctx<B::Target>`.
pub async fn request_ctx<B: Bind>(req: Request, next: Next) -> Result<Response, ApiError> {
    let (mut parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let payload: B = serde_json::from_slice(&bytes).map_err(|e| {
        warn!(error = %e, kind = std::any::type_name::<B>(), "bind failed");
        ApiError::bad_request(e.to_string())
    })?;
    let entity = payload.bind(&parts.extensions)?;

    parts.extensions.insert(Ctx(entity));
    Ok(next.run(Request::from_parts(parts, Body::empty())).await)
}

/// `Json<T>` whose rejection renders through [`ApiError`].
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "json body rejected");
                Err(ApiError::bad_request(rejection.body_text()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(name: &str, value: &str) -> HashMap<String, String> {
        HashMap::from([(name.to_string(), value.to_string())])
    }

    #[test]
    fn parses_numeric_parameter() {
        assert_eq!(path_id(&params("userId", "42"), "userId").unwrap(), 42);
    }

    #[test]
    fn rejects_non_numeric_parameter() {
        let err = path_id(&params("userId", "bad"), "userId").unwrap_err();
        assert_eq!(err.message(), "unable to parse parameter id");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rejects_missing_parameter() {
        let err = path_id(&HashMap::new(), "pillId").unwrap_err();
        assert_eq!(err.message(), "parameter pillId must be supplied");
    }

    #[test]
    fn ctx_value_reads_attached_entity() {
        let mut ext = Extensions::new();
        assert_eq!(ctx_value::<i64>(&ext), None);
        ext.insert(Ctx(7_i64));
        assert_eq!(ctx_value::<i64>(&ext), Some(7));
    }
}
