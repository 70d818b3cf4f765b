//! Auth endpoints
//!
//! `POST /signup` issues a key for a new username; `POST /validate` answers
//! whether a presented key is valid.

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AuthState;
use crate::api::types::{ApiError, Json};
use crate::domain::{IssuedCredential, ValidationResult};

/// Auth routes for any router state that can produce an `AuthState`
pub fn routes<S>() -> Router<S>
where
    AuthState: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/signup", post(signup))
        .route("/validate", post(validate))
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

/// POST /signup
///
/// 201 with `{username, api_key}`. The key is shown only here.
pub async fn signup(
    State(state): State<AuthState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<IssuedCredential>), ApiError> {
    let username = request.username.unwrap_or_default();
    let issued = state.auth_service.signup(&username).await?;

    Ok((StatusCode::CREATED, Json(issued)))
}

/// POST /validate
///
/// 200 `{valid: true}` or 403 `{valid: false}`.
pub async fn validate(
    State(state): State<AuthState>,
    Json(request): Json<ValidateRequest>,
) -> Result<(StatusCode, Json<ValidationResult>), ApiError> {
    let api_key = request.api_key.unwrap_or_default();
    let valid = state.auth_service.validate(&api_key).await?;

    if !valid {
        debug!("Validation failed for presented key");
    }

    let status = if valid {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    };

    Ok((status, Json(ValidationResult { valid })))
}
