// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Endpoints that echo the caller's verified identity.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{ClaimSet, Claims};
use crate::error::ApiError;

/// The authenticated caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub email_verified: bool,
    /// Token expiration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Every claim in the verified token
    #[schema(value_type = Object)]
    pub claims: serde_json::Value,
}

/// Session status, reachable before the email address is verified.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: String,
    pub email_verified: bool,
}

fn user_id(claims: &ClaimSet) -> Result<String, ApiError> {
    claims
        .subject()
        .map(str::to_string)
        .ok_or_else(|| ApiError::unauthorized("Token has no subject"))
}

/// Return the verified claims of the caller.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Session",
    responses(
        (status = 200, description = "Authenticated caller", body = MeResponse),
        (status = 400, description = "Missing, malformed or unverified token"),
        (status = 401, description = "Invalid or expired token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(Claims(claims): Claims) -> Result<Json<MeResponse>, ApiError> {
    Ok(Json(MeResponse {
        user_id: user_id(&claims)?,
        email: claims.email().map(str::to_string),
        email_verified: claims.email_verified(),
        expires_at: claims.expires_at(),
        claims: claims.to_json(),
    }))
}

/// Return whether the caller still has to verify their email address.
#[utoipa::path(
    get,
    path = "/v1/session",
    tag = "Session",
    responses(
        (status = 200, description = "Session status", body = SessionResponse),
        (status = 400, description = "Missing or malformed token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn session(Claims(claims): Claims) -> Result<Json<SessionResponse>, ApiError> {
    Ok(Json(SessionResponse {
        user_id: user_id(&claims)?,
        email_verified: claims.email_verified(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn claims(value: serde_json::Value) -> Claims {
        Claims(serde_json::from_value(value).unwrap())
    }

    #[tokio::test]
    async fn me_reports_claims() {
        let Json(body) = me(claims(json!({
            "sub": "user_123",
            "email": "ada@example.com",
            "email_verified": true,
            "exp": 1700003600
        })))
        .await
        .unwrap();

        assert_eq!(body.user_id, "user_123");
        assert_eq!(body.email.as_deref(), Some("ada@example.com"));
        assert!(body.email_verified);
        assert_eq!(body.expires_at.unwrap().timestamp(), 1700003600);
        assert_eq!(body.claims["sub"], "user_123");
    }

    #[tokio::test]
    async fn missing_subject_is_unauthorized() {
        let err = session(claims(json!({ "email_verified": false })))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
