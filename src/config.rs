// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `FIREBASE_PROJECT_ID` | Firebase project whose ID tokens are accepted | Required for production |
//! | `AUTH_EXEMPT_PATHS` | Comma-separated paths that skip authentication | empty |
//! | `AUTH_EMAIL_EXEMPT_PATHS` | Comma-separated paths that skip the verified-email check | empty |
//! | `AUTH_CHECK_EMAIL_VERIFIED` | Require `email_verified` (`true`/`false`) | `false` |
//! | `AUTH_CONTEXT_KEY` | Request context key for the claims | `user` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::sync::Arc;

use crate::auth::{AuthConfig, FirebaseAuth, JwksManager};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const FIREBASE_PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";
pub const AUTH_EXEMPT_PATHS_ENV: &str = "AUTH_EXEMPT_PATHS";
pub const AUTH_EMAIL_EXEMPT_PATHS_ENV: &str = "AUTH_EMAIL_EXEMPT_PATHS";
pub const AUTH_CHECK_EMAIL_VERIFIED_ENV: &str = "AUTH_CHECK_EMAIL_VERIFIED";
pub const AUTH_CONTEXT_KEY_ENV: &str = "AUTH_CONTEXT_KEY";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must be true or false, got {value:?}")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var} must be json or pretty, got {value:?}")]
    InvalidLogFormat { var: &'static str, value: String },

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Server and gate settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub firebase_project_id: Option<String>,
    pub exempt_paths: Vec<String>,
    pub email_exempt_paths: Vec<String>,
    pub check_email_verified: bool,
    pub context_key: Option<String>,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get(PORT_ENV) {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidPort {
                var: PORT_ENV,
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let check_email_verified = match get(AUTH_CHECK_EMAIL_VERIFIED_ENV) {
            Some(value) => parse_bool(AUTH_CHECK_EMAIL_VERIFIED_ENV, value)?,
            None => false,
        };

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.to_ascii_lowercase()) {
            Some(value) if value == "json" => LogFormat::Json,
            Some(value) if value == "pretty" => LogFormat::Pretty,
            Some(value) => {
                return Err(ConfigError::InvalidLogFormat {
                    var: LOG_FORMAT_ENV,
                    value,
                })
            }
            None => LogFormat::default(),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            firebase_project_id: get(FIREBASE_PROJECT_ID_ENV),
            exempt_paths: split_paths(get(AUTH_EXEMPT_PATHS_ENV)),
            email_exempt_paths: split_paths(get(AUTH_EMAIL_EXEMPT_PATHS_ENV)),
            check_email_verified,
            context_key: get(AUTH_CONTEXT_KEY_ENV),
            log_format,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|e| ConfigError::InvalidBindAddress(format!("{addr} ({e})")))
    }

    /// Gate configuration for these settings.
    ///
    /// `jwks` backs the Firebase provider when a project ID is set. Without a
    /// project ID no provider is configured and the gate fails closed.
    pub fn auth_config(&self, jwks: Option<JwksManager>) -> AuthConfig {
        let mut config = AuthConfig::new()
            .with_exempt_paths(self.exempt_paths.iter().cloned())
            .with_claim_exempt_paths(self.email_exempt_paths.iter().cloned())
            .with_check_email_verified(self.check_email_verified);

        if let Some(key) = &self.context_key {
            config = config.with_context_key(key.clone());
        }

        if let (Some(project_id), Some(jwks)) = (&self.firebase_project_id, jwks) {
            config = config.with_identity_provider(Arc::new(FirebaseAuth::with_jwks(
                project_id.clone(),
                jwks,
            )));
        }

        config
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool { var, value }),
    }
}

fn split_paths(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
