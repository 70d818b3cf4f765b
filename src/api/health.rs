//! Health check endpoints for liveness and readiness probes

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;
use crate::domain::DomainError;

use super::state::{AuthState, ItemState, StandaloneState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize, Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

/// Router states that can report on their dependencies
#[async_trait]
pub trait Readiness: Clone + Send + Sync + 'static {
    async fn checks(&self) -> Vec<HealthCheck>;
}

#[async_trait]
impl Readiness for AuthState {
    async fn checks(&self) -> Vec<HealthCheck> {
        vec![probe("credential_store", self.auth_service.check_store()).await]
    }
}

#[async_trait]
impl Readiness for ItemState {
    async fn checks(&self) -> Vec<HealthCheck> {
        vec![probe("item_store", self.item_service.check_store()).await]
    }
}

#[async_trait]
impl Readiness for StandaloneState {
    async fn checks(&self) -> Vec<HealthCheck> {
        let mut checks = self.auth.checks().await;
        checks.extend(self.items.checks().await);
        checks
    }
}

/// Returns 200 while the process is up
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Returns 200 when every store answers, 503 otherwise
pub async fn ready_check<S: Readiness>(State(state): State<S>) -> impl IntoResponse {
    let start = Instant::now();
    let checks = state.checks().await;

    let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

async fn probe(name: &str, check: impl Future<Output = Result<(), DomainError>>) -> HealthCheck {
    let start = Instant::now();
    let result = check.await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthCheck {
            name: name.to_string(),
            status: HealthStatus::Healthy,
            message: None,
            latency_ms,
        },
        Err(e) => {
            tracing::warn!(check = name, error = %e, "Readiness check failed");
            HealthCheck {
                name: name.to_string(),
                status: HealthStatus::Unhealthy,
                message: Some("unreachable".to_string()),
                latency_ms,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_healthy() {
        let check = probe("store", async { Ok(()) }).await;

        assert_eq!(check.status, HealthStatus::Healthy);
        assert!(check.message.is_none());
    }

    #[tokio::test]
    async fn test_probe_hides_error_detail() {
        let check = probe("store", async {
            Err(DomainError::storage("password authentication failed"))
        })
        .await;

        assert_eq!(check.status, HealthStatus::Unhealthy);
        assert_eq!(check.message.as_deref(), Some("unreachable"));
    }
}
