// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification as seen by the gate.

use std::sync::Arc;

use async_trait::async_trait;

use super::claims::ClaimSet;
use super::error::FailureKind;
use super::policy::ClaimPolicy;
use super::provider::IdentityProvider;

/// Turns a bearer token into a claim set for a request to `path`.
///
/// Implement this to replace verification wholesale; the gate only ever
/// sees the [`FailureKind`].
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str, path: &str) -> Result<ClaimSet, FailureKind>;
}

/// Verifier used when none is injected: identity provider, then claim policy.
#[derive(Clone)]
pub struct DefaultVerifier {
    provider: Option<Arc<dyn IdentityProvider>>,
    policy: ClaimPolicy,
}

impl DefaultVerifier {
    pub fn new(provider: Option<Arc<dyn IdentityProvider>>, policy: ClaimPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }
}

#[async_trait]
impl TokenVerifier for DefaultVerifier {
    async fn verify(&self, token: &str, path: &str) -> Result<ClaimSet, FailureKind> {
        let Some(provider) = &self.provider else {
            return Err(FailureKind::VerifierUnavailable);
        };

        let claims = provider.verify_id_token(token).await.map_err(|e| {
            tracing::debug!(path, reason = %e, "Identity provider rejected token");
            FailureKind::MalformedOrInvalidCredential
        })?;

        self.policy.check(&claims, path)?;

        Ok(claims)
    }
}
