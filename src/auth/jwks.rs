// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - JWKS is fetched via HTTPS only
//! - Keys are cached with a configurable TTL
//! - A failed refresh is reported as an error; the gate then fails closed
//!
//! Firebase publishes the signing keys for ID tokens at
//! [`GOOGLE_SECURETOKEN_JWKS_URL`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;
use url::Url;

use super::error::ProviderError;

/// JWKS endpoint for Firebase ID token signing keys.
pub const GOOGLE_SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Timeout for a single JWKS fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS manager with caching.
///
/// Cloning shares the cache.
#[derive(Clone)]
pub struct JwksManager {
    jwks_url: Url,
    cache_ttl: Duration,
    cache: Arc<RwLock<Option<CacheEntry>>>,
    client: reqwest::Client,
}

impl std::fmt::Debug for JwksManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksManager")
            .field("jwks_url", &self.jwks_url.as_str())
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl JwksManager {
    /// Create a new JWKS manager.
    ///
    /// Rejects anything but an absolute `https` URL.
    pub fn new(jwks_url: &str) -> Result<Self, ProviderError> {
        let jwks_url =
            Url::parse(jwks_url).map_err(|e| ProviderError::InvalidJwksUrl(e.to_string()))?;
        if jwks_url.scheme() != "https" {
            return Err(ProviderError::InvalidJwksUrl(format!(
                "JWKS must be fetched over https, got {}",
                jwks_url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            jwks_url,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            client,
        })
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn jwks_url(&self) -> &str {
        self.jwks_url.as_str()
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, ProviderError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        self.fetch_and_store().await
    }

    async fn fetch_and_store(&self) -> Result<JwkSet, ProviderError> {
        let jwks = self.fetch_jwks().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, ProviderError> {
        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .client
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| ProviderError::JwksFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::JwksFetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| ProviderError::JwksFetch(e.to_string()))
    }

    /// Get a decoding key for the given key ID.
    ///
    /// An unknown key ID triggers one refresh, so rotated keys are picked up
    /// before the cache expires.
    pub async fn get_decoding_key(
        &self,
        kid: &str,
    ) -> Result<(DecodingKey, Algorithm), ProviderError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = jwks.find(kid) {
            return jwk_to_decoding_key(jwk);
        }

        tracing::debug!(kid, "Key ID not in cached JWKS, refreshing");
        let jwks = self.fetch_and_store().await?;
        let jwk = jwks.find(kid).ok_or(ProviderError::NoMatchingKey)?;
        jwk_to_decoding_key(jwk)
    }

    /// Get any usable decoding key (for tokens without `kid`).
    pub async fn get_any_decoding_key(&self) -> Result<(DecodingKey, Algorithm), ProviderError> {
        let jwks = self.get_jwks().await?;

        jwks.keys
            .iter()
            .find_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .ok_or(ProviderError::NoMatchingKey)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), ProviderError> {
        self.fetch_and_store().await.map(|_| ())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), ProviderError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| ProviderError::Internal(format!("Failed to create RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            };

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| ProviderError::Internal(format!("Failed to create EC key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };

            Ok((key, alg))
        }
        _ => Err(ProviderError::Internal("Unsupported key type in JWKS".to_string())),
    }
}
