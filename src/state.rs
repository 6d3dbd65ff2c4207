// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::auth::{AuthGate, JwksManager, ProviderError, GOOGLE_SECURETOKEN_JWKS_URL};
use crate::config::Settings;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: AuthGate,
    /// Signing keys behind the Firebase provider, for readiness checks
    pub jwks: Option<JwksManager>,
}

impl AppState {
    pub fn new(gate: AuthGate) -> Self {
        Self { gate, jwks: None }
    }

    pub fn with_jwks(mut self, jwks: JwksManager) -> Self {
        self.jwks = Some(jwks);
        self
    }

    /// Build the gate described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, ProviderError> {
        let jwks = match settings.firebase_project_id {
            Some(_) => Some(JwksManager::new(GOOGLE_SECURETOKEN_JWKS_URL)?),
            None => None,
        };

        let gate = AuthGate::new(settings.auth_config(jwks.clone()));
        Ok(Self { gate, jwks })
    }
}
