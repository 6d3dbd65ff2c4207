// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token extraction and claim extractors for handlers.
//!
//! Handlers behind the gate read the verified claims with the `Claims`
//! extractor:
//!
//! ```rust,ignore
//! async fn my_handler(Claims(claims): Claims) -> impl IntoResponse {
//!     // claims is the verified ClaimSet
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Extensions, HeaderMap},
};

use super::claims::ClaimSet;
use super::error::FailureKind;

const BEARER_SCHEME: &str = "bearer";

/// Pull the bearer token out of the `Authorization` header.
///
/// Returns `None` when the header is absent, not valid UTF-8, uses another
/// scheme, or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Verified claims attached to a request, under the configured context key.
#[derive(Debug, Clone)]
pub struct ClaimContext {
    key: Arc<str>,
    claims: ClaimSet,
}

impl ClaimContext {
    pub fn new(key: Arc<str>, claims: ClaimSet) -> Self {
        Self { key, claims }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    /// Claims stored under `key`, if the gate allowed this request.
    pub fn lookup<'a>(extensions: &'a Extensions, key: &str) -> Option<&'a ClaimSet> {
        extensions
            .get::<ClaimContext>()
            .filter(|ctx| ctx.key() == key)
            .map(ClaimContext::claims)
    }
}

/// Extractor for verified claims.
///
/// Rejects with 401 when the request did not pass through the gate.
pub struct Claims(pub ClaimSet);

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = FailureKind;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ClaimContext>()
            .map(|ctx| Claims(ctx.claims().clone()))
            .ok_or(FailureKind::Rejected)
    }
}

/// Optional claims extractor.
///
/// Returns `None` on bypassed paths instead of rejecting.
pub struct OptionalClaims(pub Option<ClaimSet>);

impl<S> FromRequestParts<S> for OptionalClaims
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Claims::from_request_parts(parts, state).await {
            Ok(Claims(claims)) => Ok(OptionalClaims(Some(claims))),
            Err(_) => Ok(OptionalClaims(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};
    use serde_json::json;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn sample_claims() -> ClaimSet {
        serde_json::from_value(json!({ "sub": "user_123" })).unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer   abc  ")), Some("abc"));
    }

    #[test]
    fn missing_or_empty_token_is_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
    }

    #[test]
    fn lookup_respects_context_key() {
        let mut extensions = Extensions::new();
        extensions.insert(ClaimContext::new(Arc::from("user"), sample_claims()));

        assert_eq!(
            ClaimContext::lookup(&extensions, "user").and_then(ClaimSet::subject),
            Some("user_123")
        );
        assert!(ClaimContext::lookup(&extensions, "principal").is_none());
    }

    #[tokio::test]
    async fn claims_extractor_reads_context() {
        let mut parts = parts();
        parts
            .extensions
            .insert(ClaimContext::new(Arc::from("user"), sample_claims()));

        let Claims(claims) = Claims::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(claims.subject(), Some("user_123"));
    }

    #[tokio::test]
    async fn claims_extractor_rejects_without_context() {
        let mut parts = parts();
        let result = Claims::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(FailureKind::Rejected)));
    }

    #[tokio::test]
    async fn optional_claims_returns_none_without_context() {
        let mut parts = parts();
        let result = OptionalClaims::from_request_parts(&mut parts, &()).await;
        assert!(result.unwrap().0.is_none());
    }
}
