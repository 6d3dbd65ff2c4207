// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gate configuration and defaulting.
//!
//! Build an [`AuthConfig`] with the `with_*` methods and hand it to
//! [`AuthGate::new`](super::AuthGate::new), which fills in the defaults via
//! [`AuthConfig::with_defaults`]. Unset options get:
//!
//! | Option | Default |
//! |--------|---------|
//! | context key | `"user"` (also when set to `""`) |
//! | bypass predicate | never bypasses |
//! | success handler | forward to the next handler |
//! | error handler | [`default_error_response`] |
//! | verifier | [`DefaultVerifier`] over the identity provider |
//!
//! A missing identity provider is a configuration error. It is logged loudly
//! but the configuration still builds, and every request is then denied with
//! [`FailureKind::VerifierUnavailable`].

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use super::error::{default_error_response, FailureKind};
use super::paths::PathMatcher;
use super::policy::ClaimPolicy;
use super::provider::IdentityProvider;
use super::verifier::{DefaultVerifier, TokenVerifier};

/// Context key used when none is configured.
pub const DEFAULT_CONTEXT_KEY: &str = "user";

pub type BoxResponseFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Returns `true` to skip authentication for a request.
pub type BypassFn = Arc<dyn Fn(&Parts) -> bool + Send + Sync>;
/// Runs for allowed and bypassed requests.
pub type SuccessFn = Arc<dyn Fn(Request, Next) -> BoxResponseFuture + Send + Sync>;
/// Maps a denial to a response.
pub type ErrorFn = Arc<dyn Fn(FailureKind) -> Response + Send + Sync>;

/// Authentication gate configuration.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Skip authentication when this returns `true`
    pub bypass: Option<BypassFn>,
    /// Paths that skip authentication (exact match)
    pub exempt_paths: HashSet<String>,
    /// Paths that skip the verified-email check (exact match)
    pub claim_exempt_paths: HashSet<String>,
    /// Verifies token signatures and format
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
    /// Replaces the default verifier entirely
    pub verifier: Option<Arc<dyn TokenVerifier>>,
    /// Require `email_verified == true`
    pub check_email_verified: bool,
    pub success_handler: Option<SuccessFn>,
    pub error_handler: Option<ErrorFn>,
    /// Key the claims are stored under in the request context
    pub context_key: Option<String>,
    synthesized: Option<SynthesizedVerifier>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bypass", &self.bypass.is_some())
            .field("exempt_paths", &self.exempt_paths)
            .field("claim_exempt_paths", &self.claim_exempt_paths)
            .field("identity_provider", &self.identity_provider.is_some())
            .field("verifier", &self.verifier.is_some())
            .field("check_email_verified", &self.check_email_verified)
            .field("success_handler", &self.success_handler.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .field("context_key", &self.context_key)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_bypass<F>(mut self, bypass: F) -> Self
    where
        F: Fn(&Parts) -> bool + Send + Sync + 'static,
    {
        self.bypass = Some(Arc::new(bypass));
        self
    }

    pub fn with_exempt_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exempt_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_claim_exempt_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claim_exempt_paths
            .extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_check_email_verified(mut self, enabled: bool) -> Self {
        self.check_email_verified = enabled;
        self
    }

    pub fn with_success_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.success_handler = Some(Arc::new(move |request: Request, next: Next| {
            Box::pin(handler(request, next)) as BoxResponseFuture
        }));
        self
    }

    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(FailureKind) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_context_key(mut self, key: impl Into<String>) -> Self {
        self.context_key = Some(key.into());
        self
    }

    /// Path matcher over the configured exempt sets.
    pub fn path_matcher(&self) -> PathMatcher {
        PathMatcher::new(
            self.exempt_paths.iter().cloned(),
            self.claim_exempt_paths.iter().cloned(),
        )
    }

    /// Fill in every unset option. Explicit values are never overwritten, so
    /// applying this to an already defaulted config changes nothing.
    ///
    /// A verifier filled in here is rebuilt whenever the claim policy inputs
    /// it was built from have changed since; an injected one is kept as is.
    pub fn with_defaults(mut self) -> Self {
        self.apply_defaults();
        self
    }

    /// Whether every defaultable option is populated.
    pub fn is_resolved(&self) -> bool {
        self.bypass.is_some()
            && self.verifier.is_some()
            && self.success_handler.is_some()
            && self.error_handler.is_some()
            && self.context_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Apply the defaults and return the values the gate runs with.
    pub(crate) fn resolve(mut self) -> ResolvedConfig {
        self.apply_defaults()
    }

    fn apply_defaults(&mut self) -> ResolvedConfig {
        let context_key = match self.context_key.take() {
            Some(key) if !key.is_empty() => key,
            _ => DEFAULT_CONTEXT_KEY.to_string(),
        };
        self.context_key = Some(context_key.clone());

        let verifier = match self.injected_verifier() {
            Some(verifier) => verifier,
            None => {
                if self.identity_provider.is_none() {
                    tracing::error!(
                        "No identity provider configured for the auth gate; \
                         every authenticated request will be denied. \
                         Pass a Firebase app via AuthConfig::with_identity_provider"
                    );
                }
                self.default_verifier()
            }
        };

        ResolvedConfig {
            bypass: self.bypass.get_or_insert_with(never_bypass).clone(),
            paths: self.path_matcher(),
            verifier,
            success_handler: self.success_handler.get_or_insert_with(forward_to_next).clone(),
            error_handler: self.error_handler.get_or_insert_with(default_error_handler).clone(),
            context_key: Arc::from(context_key),
        }
    }

    /// The configured verifier, unless it is the one filled in by defaulting.
    fn injected_verifier(&self) -> Option<Arc<dyn TokenVerifier>> {
        let current = self.verifier.as_ref()?;
        match &self.synthesized {
            Some(synthesized) if Arc::ptr_eq(current, &synthesized.verifier) => None,
            _ => Some(current.clone()),
        }
    }

    fn default_verifier(&mut self) -> Arc<dyn TokenVerifier> {
        if let Some(synthesized) = self.synthesized.as_ref().filter(|s| s.built_from(self)) {
            return synthesized.verifier.clone();
        }

        let policy = ClaimPolicy::new(self.check_email_verified, self.path_matcher());
        let verifier: Arc<dyn TokenVerifier> =
            Arc::new(DefaultVerifier::new(self.identity_provider.clone(), policy));

        self.verifier = Some(verifier.clone());
        self.synthesized = Some(SynthesizedVerifier {
            verifier: verifier.clone(),
            identity_provider: self.identity_provider.clone(),
            check_email_verified: self.check_email_verified,
            claim_exempt_paths: self.claim_exempt_paths.clone(),
        });
        verifier
    }
}

/// A [`DefaultVerifier`] filled in by defaulting, with the inputs it was
/// built from.
#[derive(Clone)]
struct SynthesizedVerifier {
    verifier: Arc<dyn TokenVerifier>,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
    check_email_verified: bool,
    claim_exempt_paths: HashSet<String>,
}

impl SynthesizedVerifier {
    fn built_from(&self, config: &AuthConfig) -> bool {
        let same_provider = match (&self.identity_provider, &config.identity_provider) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_provider
            && self.check_email_verified == config.check_email_verified
            && self.claim_exempt_paths == config.claim_exempt_paths
    }
}

/// Fully defaulted gate options.
pub(crate) struct ResolvedConfig {
    pub(crate) bypass: BypassFn,
    pub(crate) paths: PathMatcher,
    pub(crate) verifier: Arc<dyn TokenVerifier>,
    pub(crate) success_handler: SuccessFn,
    pub(crate) error_handler: ErrorFn,
    pub(crate) context_key: Arc<str>,
}

fn never_bypass() -> BypassFn {
    Arc::new(|_: &Parts| false)
}

fn forward_to_next() -> SuccessFn {
    Arc::new(|request: Request, next: Next| {
        Box::pin(async move { next.run(request).await }) as BoxResponseFuture
    })
}

fn default_error_handler() -> ErrorFn {
    Arc::new(default_error_response)
}
