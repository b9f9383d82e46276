//! Health check endpoints for liveness and readiness probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;

use super::state::AppState;

/// Health response with optional component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

fn healthy_response() -> HealthResponse {
    HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    }
}

/// GET /health - returns 200 while the process is running
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(healthy_response()))
}

/// GET /live - liveness probe
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /ready - 200 only when the user store answers
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let store_check = check_user_store(&state).await;
    let status = store_check.status;

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(vec![store_check]),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(response))
}

async fn check_user_store(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let result = state.user_service.count().await;
    let latency_ms = Some(start.elapsed().as_millis() as u64);

    match result {
        Ok(_) => HealthCheck {
            name: "user_store".to_string(),
            status: HealthStatus::Healthy,
            message: None,
            latency_ms,
        },
        Err(e) => {
            tracing::warn!(error = %e, "User store readiness check failed");
            HealthCheck {
                name: "user_store".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some("User store unavailable".to_string()),
                latency_ms,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::state::UserServiceTrait;
    use crate::domain::{DomainError, NewUser, User, UserPatch};
    use crate::infrastructure::user::{BcryptHasher, InMemoryUserRepository, UserService};

    /// Service whose store is always down
    struct UnavailableService;

    #[async_trait::async_trait]
    impl UserServiceTrait for UnavailableService {
        async fn create(&self, _: NewUser) -> Result<User, DomainError> {
            Err(DomainError::storage("down"))
        }
        async fn find_one(&self, _: &str) -> Result<User, DomainError> {
            Err(DomainError::storage("down"))
        }
        async fn find(&self) -> Result<Vec<User>, DomainError> {
            Err(DomainError::storage("down"))
        }
        async fn count(&self) -> Result<u64, DomainError> {
            Err(DomainError::storage("down"))
        }
        async fn update(&self, _: &str, _: UserPatch) -> Result<User, DomainError> {
            Err(DomainError::storage("down"))
        }
        async fn update_many(&self, _: &[String], _: UserPatch) -> Result<u64, DomainError> {
            Err(DomainError::storage("down"))
        }
        async fn delete_one(&self, _: &str) -> Result<(), DomainError> {
            Err(DomainError::storage("down"))
        }
        async fn delete(&self, _: &[String]) -> Result<u64, DomainError> {
            Err(DomainError::storage("down"))
        }
    }

    #[test]
    fn test_healthy_response_serialization() {
        let json = serde_json::to_value(healthy_response()).unwrap();

        assert_eq!(json["status"], "healthy");
        assert!(json.get("checks").is_none());
    }

    #[tokio::test]
    async fn test_store_check_healthy() {
        let service = UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(BcryptHasher::with_cost(4)),
        );
        let state = AppState::new(Arc::new(service));

        let check = check_user_store(&state).await;

        assert_eq!(check.status, HealthStatus::Healthy);
        assert!(check.message.is_none());
    }

    #[tokio::test]
    async fn test_store_check_unhealthy() {
        let state = AppState::new(Arc::new(UnavailableService));

        let check = check_user_store(&state).await;

        assert_eq!(check.status, HealthStatus::Unhealthy);
        assert_eq!(check.message.as_deref(), Some("User store unavailable"));
    }
}
