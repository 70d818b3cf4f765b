//! API key gate for the item routes
//!
//! Every gated request is checked against the key validator before the
//! handler runs. Nothing is cached here; see `CachedKeyValidator` for that.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::types::ApiError;
use crate::domain::{DomainError, KeyValidator};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Why a request was turned away
#[derive(Debug, Error)]
pub enum GateError {
    #[error("API key required")]
    MissingKey,

    #[error("Invalid API key")]
    Rejected,

    /// The validator could not answer; the caller still sees a rejection
    #[error("Invalid API key")]
    ValidatorUnavailable(#[source] DomainError),
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::MissingKey => ApiError::unauthorized(err.to_string()),
            GateError::Rejected | GateError::ValidatorUnavailable(_) => {
                ApiError::forbidden(err.to_string())
            }
        }
    }
}

/// Middleware for `axum::middleware::from_fn_with_state`
pub async fn require_api_key(
    State(validator): State<Arc<dyn KeyValidator>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(validator.as_ref(), request.headers()).await?;
    Ok(next.run(request).await)
}

/// Runs the presented key past the validator
pub async fn authorize(validator: &dyn KeyValidator, headers: &HeaderMap) -> Result<(), GateError> {
    let api_key = extract_api_key(headers).ok_or(GateError::MissingKey)?;
    let key_prefix: String = api_key.chars().take(8).collect();

    match validator.validate(api_key).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            debug!(key_prefix = %key_prefix, "API key rejected");
            Err(GateError::Rejected)
        }
        Err(e) => {
            warn!(key_prefix = %key_prefix, error = %e, "Key validator unavailable, rejecting request");
            Err(GateError::ValidatorUnavailable(e))
        }
    }
}

/// Absent, non-UTF-8 and blank headers all count as no key
fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::MockKeyValidator;
    use axum::http::{HeaderValue, StatusCode};
    use mockall::predicate::eq;

    fn headers_with(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        headers
    }

    #[test]
    fn test_extract_api_key() {
        assert_eq!(extract_api_key(&headers_with("ak_abc")), Some("ak_abc"));
        assert_eq!(extract_api_key(&headers_with("  ak_abc ")), Some("ak_abc"));
        assert_eq!(extract_api_key(&headers_with("   ")), None);
        assert_eq!(extract_api_key(&HeaderMap::new()), None);
    }

    #[test]
    fn test_non_utf8_header_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_bytes(&[0xfa, 0xfb]).unwrap());

        assert_eq!(extract_api_key(&headers), None);
    }

    #[tokio::test]
    async fn test_missing_key_skips_validator() {
        let mut validator = MockKeyValidator::new();
        validator.expect_validate().never();

        let result = authorize(&validator, &HeaderMap::new()).await;

        assert!(matches!(result, Err(GateError::MissingKey)));
    }

    #[tokio::test]
    async fn test_valid_key_passes() {
        let mut validator = MockKeyValidator::new();
        validator
            .expect_validate()
            .with(eq("ak_good"))
            .times(1)
            .returning(|_| Ok(true));

        assert!(authorize(&validator, &headers_with("ak_good")).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejected_and_unavailable_stay_distinct() {
        let mut validator = MockKeyValidator::new();
        validator.expect_validate().returning(|_| Ok(false));
        let rejected = authorize(&validator, &headers_with("wrong")).await;
        assert!(matches!(rejected, Err(GateError::Rejected)));

        let mut validator = MockKeyValidator::new();
        validator
            .expect_validate()
            .returning(|_| Err(DomainError::validator_unavailable("timed out")));
        let unavailable = authorize(&validator, &headers_with("ak_any")).await;
        assert!(matches!(unavailable, Err(GateError::ValidatorUnavailable(_))));
    }

    #[test]
    fn test_gate_error_responses() {
        let err: ApiError = GateError::MissingKey.into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.body.error, "API key required");

        let err: ApiError = GateError::Rejected.into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.body.error, "Invalid API key");

        let err: ApiError =
            GateError::ValidatorUnavailable(DomainError::validator_unavailable("down")).into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.body.error, "Invalid API key");
    }
}
