// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication failures and gate outcomes.
//!
//! [`FailureKind`] is what the gate decides on. [`ProviderError`] carries the
//! identity provider's detailed reason, which is logged but never shown to the
//! caller: the default verifier collapses it to
//! [`FailureKind::MalformedOrInvalidCredential`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::claims::ClaimSet;

/// Body for every credential-related 400.
pub const MISSING_OR_MALFORMED_BODY: &str = "Missing or malformed Token";
/// Body returned when no identity provider is configured.
pub const VERIFIER_UNAVAILABLE_BODY: &str = "Missing or Invalid Firebase App Object";
/// Body for the 401 fallback.
pub const INVALID_OR_EXPIRED_BODY: &str = "Invalid or expired Token";

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No bearer token on the request
    MissingCredential,
    /// The identity provider rejected the token (expired, bad signature, ...)
    MalformedOrInvalidCredential,
    /// Token is valid but the `email_verified` claim is absent or false
    EmailNotVerified,
    /// No identity provider configured, the gate fails closed
    VerifierUnavailable,
    /// Any other rejection reported by a custom verifier
    Rejected,
}

impl FailureKind {
    /// Stable machine-readable code, used in logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            FailureKind::MissingCredential => "missing_credential",
            FailureKind::MalformedOrInvalidCredential => "malformed_or_invalid_credential",
            FailureKind::EmailNotVerified => "email_not_verified",
            FailureKind::VerifierUnavailable => "verifier_unavailable",
            FailureKind::Rejected => "rejected",
        }
    }

    /// HTTP status used by the default error continuation.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FailureKind::MissingCredential
            | FailureKind::MalformedOrInvalidCredential
            | FailureKind::EmailNotVerified
            | FailureKind::VerifierUnavailable => StatusCode::BAD_REQUEST,
            FailureKind::Rejected => StatusCode::UNAUTHORIZED,
        }
    }

    /// Response body used by the default error continuation.
    pub fn response_body(&self) -> &'static str {
        match self {
            FailureKind::MissingCredential
            | FailureKind::MalformedOrInvalidCredential
            | FailureKind::EmailNotVerified => MISSING_OR_MALFORMED_BODY,
            FailureKind::VerifierUnavailable => VERIFIER_UNAVAILABLE_BODY,
            FailureKind::Rejected => INVALID_OR_EXPIRED_BODY,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::MissingCredential => write!(f, "Missing bearer token"),
            FailureKind::MalformedOrInvalidCredential => write!(f, "Token is malformed or invalid"),
            FailureKind::EmailNotVerified => write!(f, "Email not verified"),
            FailureKind::VerifierUnavailable => write!(f, "No identity provider configured"),
            FailureKind::Rejected => write!(f, "Token rejected"),
        }
    }
}

impl std::error::Error for FailureKind {}

impl IntoResponse for FailureKind {
    fn into_response(self) -> Response {
        default_error_response(self)
    }
}

/// The default error continuation: status and plain-text body per failure.
pub fn default_error_response(kind: FailureKind) -> Response {
    (kind.status_code(), kind.response_body()).into_response()
}

/// Terminal state of one pass through the gate.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// Path skipped authentication entirely
    Bypassed,
    /// Token verified and claim policy satisfied
    Allowed(ClaimSet),
    /// Request denied
    Denied(FailureKind),
}

impl AuthOutcome {
    pub fn is_denied(&self) -> bool {
        matches!(self, AuthOutcome::Denied(_))
    }
}

impl From<Result<ClaimSet, FailureKind>> for AuthOutcome {
    fn from(result: Result<ClaimSet, FailureKind>) -> Self {
        match result {
            Ok(claims) => AuthOutcome::Allowed(claims),
            Err(kind) => AuthOutcome::Denied(kind),
        }
    }
}

/// Identity provider failure.
///
/// Kept detailed for logging; callers only ever see a [`FailureKind`].
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Token is malformed")]
    MalformedToken,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token issuer is invalid")]
    InvalidIssuer,

    #[error("Token audience is invalid")]
    InvalidAudience,

    #[error("Token is not yet valid")]
    TokenNotYetValid,

    #[error("Token has no subject")]
    MissingSubject,

    #[error("Failed to fetch JWKS: {0}")]
    JwksFetch(String),

    #[error("No matching key found in JWKS")]
    NoMatchingKey,

    #[error("Invalid JWKS URL: {0}")]
    InvalidJwksUrl(String),

    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl From<jsonwebtoken::errors::Error> for ProviderError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::ExpiredSignature => ProviderError::TokenExpired,
            ErrorKind::InvalidSignature => ProviderError::InvalidSignature,
            ErrorKind::InvalidIssuer => ProviderError::InvalidIssuer,
            ErrorKind::InvalidAudience => ProviderError::InvalidAudience,
            ErrorKind::ImmatureSignature => ProviderError::TokenNotYetValid,
            _ => ProviderError::MalformedToken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn credential_failures_return_400_missing_or_malformed() {
        for kind in [
            FailureKind::MissingCredential,
            FailureKind::MalformedOrInvalidCredential,
            FailureKind::EmailNotVerified,
        ] {
            let response = default_error_response(kind);
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_of(response).await, "Missing or malformed Token");
        }
    }

    #[tokio::test]
    async fn verifier_unavailable_names_the_missing_app() {
        let response = FailureKind::VerifierUnavailable.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await, "Missing or Invalid Firebase App Object");
    }

    #[tokio::test]
    async fn other_rejections_fall_back_to_401() {
        let response = default_error_response(FailureKind::Rejected);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_of(response).await, "Invalid or expired Token");
    }

    #[test]
    fn outcome_from_result() {
        let denied: AuthOutcome = Err(FailureKind::EmailNotVerified).into();
        assert!(matches!(denied, AuthOutcome::Denied(FailureKind::EmailNotVerified)));
        assert!(denied.is_denied());

        let allowed: AuthOutcome = Ok(ClaimSet::default()).into();
        assert!(matches!(allowed, AuthOutcome::Allowed(_)));
    }

    #[test]
    fn provider_error_messages() {
        assert_eq!(ProviderError::TokenExpired.to_string(), "Token has expired");
        assert_eq!(
            ProviderError::JwksFetch("HTTP 503".into()).to_string(),
            "Failed to fetch JWKS: HTTP 503"
        );
    }
}
