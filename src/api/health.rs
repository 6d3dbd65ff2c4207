// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Readiness response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

/// Individual readiness check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// "firebase" when an identity provider is configured, otherwise "unconfigured".
    pub identity_provider: String,
    /// JWKS (signing keys) status. Only present with a Firebase provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<String>,
}

/// Simple response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Check if signing keys are available, fetching them if not cached.
async fn check_jwks(state: &AppState) -> Option<String> {
    let jwks = state.jwks.as_ref()?;
    if jwks.is_cached().await {
        return Some("ok".to_string());
    }

    match jwks.refresh().await {
        Ok(()) => Some("ok".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "JWKS unavailable");
            Some("unavailable".to_string())
        }
    }
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
///
/// Returns 503 while the gate would deny every request: no identity
/// provider configured, or its signing keys cannot be fetched.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let jwks = check_jwks(&state).await;
    let provider_ok = state.jwks.is_some();
    let jwks_ok = jwks.as_deref().is_none_or(|s| s == "ok");
    let all_ok = provider_ok && jwks_ok;

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            identity_provider: if provider_ok { "firebase" } else { "unconfigured" }.to_string(),
            jwks,
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthConfig, AuthGate};

    #[tokio::test]
    async fn liveness_is_ok() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn readiness_degraded_without_provider() {
        let state = AppState::new(AuthGate::new(AuthConfig::new()));
        let (status, Json(body)) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.checks.identity_provider, "unconfigured");
        assert!(body.checks.jwks.is_none());
    }
}
