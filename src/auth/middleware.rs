// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication gate middleware for Axum.
//!
//! One pass per request:
//!
//! 1. Bypass predicate or exempt path → forward, the verifier is not called
//! 2. No bearer token → `MissingCredential`
//! 3. Verifier (identity provider + claim policy) → claims or a failure
//! 4. Allowed → claims go into the request extensions under the context key,
//!    then the success handler runs; Denied → the error handler runs
//!
//! ```rust,ignore
//! let gate = AuthGate::new(
//!     AuthConfig::new()
//!         .with_identity_provider(Arc::new(FirebaseAuth::new("my-project")?))
//!         .with_exempt_paths(["/health"]),
//! );
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(gate.layer());
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::request::Parts,
    middleware::{from_fn_with_state, FromFnLayer, Next},
    response::Response,
};

use super::config::{AuthConfig, BoxResponseFuture, ResolvedConfig};
use super::error::{AuthOutcome, FailureKind};
use super::extractor::{bearer_token, ClaimContext};
use super::paths::PathMatcher;

/// Middleware function behind [`AuthGate::layer`].
pub type GateFn = fn(State<AuthGate>, Request, Next) -> BoxResponseFuture;

/// Layer returned by [`AuthGate::layer`].
pub type AuthLayer = FromFnLayer<GateFn, AuthGate, (State<AuthGate>, Request)>;

/// The authentication gate. Immutable once built; clones share it.
#[derive(Clone)]
pub struct AuthGate {
    inner: Arc<ResolvedConfig>,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("paths", &self.inner.paths)
            .field("context_key", &self.inner.context_key)
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    /// Build a gate, applying defaults to every unset option.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            inner: Arc::new(config.resolve()),
        }
    }

    /// Tower layer running this gate in front of a router or route.
    pub fn layer(&self) -> AuthLayer {
        from_fn_with_state(self.clone(), run_gate as GateFn)
    }

    pub fn context_key(&self) -> &str {
        &self.inner.context_key
    }

    pub fn path_matcher(&self) -> &PathMatcher {
        &self.inner.paths
    }

    /// Decide the outcome for a request without running any continuation.
    pub async fn evaluate(&self, parts: &Parts) -> AuthOutcome {
        let path = parts.uri.path();

        if (self.inner.bypass)(parts) || self.inner.paths.is_bypassed(path) {
            tracing::trace!(path, "Authentication bypassed");
            return AuthOutcome::Bypassed;
        }

        let Some(token) = bearer_token(&parts.headers) else {
            return AuthOutcome::Denied(FailureKind::MissingCredential);
        };

        self.inner.verifier.verify(token, path).await.into()
    }

    /// Run the gate: evaluate, then dispatch to the success or error handler.
    pub async fn handle(&self, request: Request, next: Next) -> Response {
        let (mut parts, body) = request.into_parts();
        let outcome = self.evaluate(&parts).await;

        match outcome {
            AuthOutcome::Bypassed => {
                (self.inner.success_handler)(Request::from_parts(parts, body), next).await
            }
            AuthOutcome::Allowed(claims) => {
                tracing::debug!(
                    path = parts.uri.path(),
                    subject = claims.subject().unwrap_or_default(),
                    "Request authenticated"
                );
                parts
                    .extensions
                    .insert(ClaimContext::new(self.inner.context_key.clone(), claims));
                (self.inner.success_handler)(Request::from_parts(parts, body), next).await
            }
            AuthOutcome::Denied(kind) => {
                tracing::info!(
                    path = parts.uri.path(),
                    reason = kind.error_code(),
                    "Request denied"
                );
                (self.inner.error_handler)(kind)
            }
        }
    }
}

fn run_gate(State(gate): State<AuthGate>, request: Request, next: Next) -> BoxResponseFuture {
    Box::pin(async move { gate.handle(request, next).await })
}

/// Authentication middleware function.
///
/// Use with `axum::middleware::from_fn_with_state(gate, auth_gate)`.
pub async fn auth_gate(State(gate): State<AuthGate>, request: Request, next: Next) -> Response {
    gate.handle(request, next).await
}
