// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Post-verification claim checks.

use super::claims::ClaimSet;
use super::error::FailureKind;
use super::paths::PathMatcher;

/// Verified-email policy applied after the token itself has been verified.
#[derive(Debug, Clone, Default)]
pub struct ClaimPolicy {
    check_email_verified: bool,
    paths: PathMatcher,
}

impl ClaimPolicy {
    pub fn new(check_email_verified: bool, paths: PathMatcher) -> Self {
        Self {
            check_email_verified,
            paths,
        }
    }

    pub fn checks_email_verified(&self) -> bool {
        self.check_email_verified
    }

    /// Check `claims` for a request to `path`.
    ///
    /// Disabled policy never inspects the claims. Enabled policy requires
    /// `email_verified == true` unless `path` is claim-exempt.
    pub fn check(&self, claims: &ClaimSet, path: &str) -> Result<(), FailureKind> {
        if !self.check_email_verified || self.paths.is_claim_exempt(path) {
            return Ok(());
        }

        if claims.email_verified() {
            Ok(())
        } else {
            Err(FailureKind::EmailNotVerified)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unverified() -> ClaimSet {
        serde_json::from_value(json!({ "sub": "u1", "email_verified": false })).unwrap()
    }

    fn verified() -> ClaimSet {
        serde_json::from_value(json!({ "sub": "u1", "email_verified": true })).unwrap()
    }

    #[test]
    fn disabled_policy_allows_unverified() {
        let policy = ClaimPolicy::new(false, PathMatcher::default());
        assert!(policy.check(&unverified(), "/private").is_ok());
    }

    #[test]
    fn enabled_policy_rejects_unverified() {
        let policy = ClaimPolicy::new(true, PathMatcher::new(Vec::<String>::new(), ["/public"]));
        assert_eq!(
            policy.check(&unverified(), "/private"),
            Err(FailureKind::EmailNotVerified)
        );
        assert!(policy.check(&verified(), "/private").is_ok());
    }

    #[test]
    fn claim_exempt_path_skips_check() {
        let policy = ClaimPolicy::new(true, PathMatcher::new(Vec::<String>::new(), ["/public"]));
        assert!(policy.check(&unverified(), "/public").is_ok());
    }

    #[test]
    fn missing_claim_counts_as_unverified() {
        let policy = ClaimPolicy::new(true, PathMatcher::default());
        let claims: ClaimSet = serde_json::from_value(json!({ "sub": "u1" })).unwrap();
        assert_eq!(policy.check(&claims, "/"), Err(FailureKind::EmailNotVerified));
    }
}
