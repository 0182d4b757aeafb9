use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT payload: the authenticated user's id and nothing else.
///
/// No `exp` is issued, so tokens stay valid until the secret rotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub id: i64,
}

/// Claims as they arrive on the wire. Some signers encode numbers as
/// floats, so `id` is taken as any JSON number and converted explicitly.
#[derive(Debug, Deserialize)]
pub(crate) struct WireClaims {
    pub id: serde_json::Number,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("claim id is not an integer")]
    NotIntegral,
    #[error("claim id is out of range")]
    OutOfRange,
}

impl TryFrom<WireClaims> for Claims {
    type Error = ClaimsError;

    fn try_from(raw: WireClaims) -> Result<Self, Self::Error> {
        if let Some(id) = raw.id.as_i64() {
            return Ok(Self { id });
        }
        if raw.id.is_u64() {
            return Err(ClaimsError::OutOfRange);
        }
        let f = raw.id.as_f64().ok_or(ClaimsError::NotIntegral)?;
        if f.fract() != 0.0 {
            return Err(ClaimsError::NotIntegral);
        }
        // i64::MAX as f64 rounds up to 2^63, which is itself out of range
        if f < i64::MIN as f64 || f >= i64::MAX as f64 {
            return Err(ClaimsError::OutOfRange);
        }
        Ok(Self { id: f as i64 })
    }
}
