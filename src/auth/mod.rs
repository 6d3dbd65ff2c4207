// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Gate
//!
//! Bearer token authentication for Axum routers.
//!
//! ## Auth Flow
//!
//! 1. Client authenticates with Firebase and obtains an ID token
//! 2. Client sends `Authorization: Bearer <ID token>`
//! 3. The gate:
//!    - Skips exempt paths entirely
//!    - Verifies signature, expiry, issuer and audience against the
//!      Firebase signing keys (HTTPS-only JWKS, cached)
//!    - Optionally requires `email_verified`, except on claim-exempt paths
//!    - Attaches the claims to the request under the context key
//!
//! ## Security
//!
//! - Missing identity provider fails closed: every request is denied
//! - Provider failure details are logged, never returned to the client
//! - Path exemptions are exact matches only

pub mod claims;
pub mod config;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod paths;
pub mod policy;
pub mod provider;
pub mod verifier;

pub use claims::ClaimSet;
pub use config::{AuthConfig, DEFAULT_CONTEXT_KEY};
pub use error::{default_error_response, AuthOutcome, FailureKind, ProviderError};
pub use extractor::{bearer_token, ClaimContext, Claims, OptionalClaims};
pub use jwks::{JwksManager, GOOGLE_SECURETOKEN_JWKS_URL};
pub use middleware::{auth_gate, AuthGate, AuthLayer};
pub use paths::PathMatcher;
pub use policy::ClaimPolicy;
#[cfg(feature = "dev")]
pub use provider::InsecureProvider;
pub use provider::{FirebaseAuth, IdentityProvider};
pub use verifier::{DefaultVerifier, TokenVerifier};
