// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exempt path matching.
//!
//! Matching is exact string equality against the request path. There is no
//! prefix or glob matching: `/health` does not exempt `/health/ready`.

use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMatcher {
    /// Paths that skip authentication entirely
    exempt: HashSet<String>,
    /// Paths that skip only the claim policy
    claim_exempt: HashSet<String>,
}

impl PathMatcher {
    pub fn new<I, J, S, T>(exempt: I, claim_exempt: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            exempt: exempt.into_iter().map(Into::into).collect(),
            claim_exempt: claim_exempt.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `path` skips authentication.
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.exempt.contains(path)
    }

    /// Whether `path` skips the claim policy (authentication still applies).
    pub fn is_claim_exempt(&self, path: &str) -> bool {
        !self.claim_exempt.is_empty() && self.claim_exempt.contains(path)
    }

    pub fn exempt_paths(&self) -> &HashSet<String> {
        &self.exempt
    }

    pub fn claim_exempt_paths(&self) -> &HashSet<String> {
        &self.claim_exempt
    }
}
