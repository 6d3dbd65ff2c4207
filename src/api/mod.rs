// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

pub mod health;
pub mod session;

/// Build the application router.
///
/// Routes under `/v1` sit behind the authentication gate. Paths are matched
/// in full (`/v1/me`), so exempt-path settings use the same form.
/// `/v1/session` is meant to be listed in `AUTH_EMAIL_EXEMPT_PATHS` so that
/// callers can check their status before verifying their email address.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/me", get(session::me))
        .route("/v1/session", get(session::session))
        .layer(state.gate.layer());

    let probes = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(protected)
        .merge(probes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        session::me,
        session::session
    ),
    components(schemas(
        health::HealthResponse,
        health::ReadyResponse,
        health::HealthChecks,
        session::MeResponse,
        session::SessionResponse
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Session", description = "Identity of the authenticated caller")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthConfig, AuthGate, ClaimSet, IdentityProvider, ProviderError};
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StubProvider;

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn verify_id_token(&self, token: &str) -> Result<ClaimSet, ProviderError> {
            match token {
                "unverified" => Ok(serde_json::from_value(
                    json!({ "sub": "user_123", "email_verified": false }),
                )
                .unwrap()),
                _ => Err(ProviderError::MalformedToken),
            }
        }
    }

    fn app() -> Router {
        let gate = AuthGate::new(
            AuthConfig::new()
                .with_identity_provider(Arc::new(StubProvider))
                .with_check_email_verified(true)
                .with_claim_exempt_paths(["/v1/session"]),
        );
        router(AppState::new(gate))
    }

    async fn send(path: &str, token: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_is_outside_the_gate() {
        let (status, _) = send("/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_requires_token() {
        let (status, body) = send("/v1/me", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing or malformed Token");
    }

    #[tokio::test]
    async fn unverified_email_blocked_except_on_session() {
        let (status, body) = send("/v1/me", Some("unverified")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing or malformed Token");

        let (status, body) = send("/v1/session", Some("unverified")).await;
        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["user_id"], "user_123");
        assert_eq!(body["email_verified"], false);
    }

    #[test]
    fn openapi_documents_bearer_auth() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
