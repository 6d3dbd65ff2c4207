// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity providers: the collaborators that actually verify a token.
//!
//! ## Firebase ID tokens
//!
//! - Signed with RS256 by keys published at the securetoken JWKS endpoint
//! - `iss` must be `https://securetoken.google.com/<project-id>`
//! - `aud` must be `<project-id>`
//! - `sub` must be a non-empty string
//! - Clock skew tolerance is 60 seconds

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use super::claims::ClaimSet;
use super::error::ProviderError;
use super::jwks::{JwksManager, GOOGLE_SECURETOKEN_JWKS_URL};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Verifies the cryptographic validity and format of a token.
///
/// Any failure (expired, malformed, bad signature, revoked) is reported as a
/// [`ProviderError`]; callers decide how much of it to reveal.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_id_token(&self, token: &str) -> Result<ClaimSet, ProviderError>;
}

enum KeySource {
    Jwks(JwksManager),
    Static {
        key: DecodingKey,
        algorithm: Algorithm,
    },
}

/// Firebase Authentication ID token verifier.
pub struct FirebaseAuth {
    project_id: String,
    issuer: String,
    keys: KeySource,
}

impl std::fmt::Debug for FirebaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = match &self.keys {
            KeySource::Jwks(jwks) => jwks.jwks_url().to_string(),
            KeySource::Static { algorithm, .. } => format!("static {algorithm:?}"),
        };
        f.debug_struct("FirebaseAuth")
            .field("project_id", &self.project_id)
            .field("keys", &keys)
            .finish()
    }
}

impl FirebaseAuth {
    /// Verifier for `project_id` using Google's published signing keys.
    pub fn new(project_id: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self::with_jwks(
            project_id,
            JwksManager::new(GOOGLE_SECURETOKEN_JWKS_URL)?,
        ))
    }

    /// Verifier backed by a custom JWKS manager.
    pub fn with_jwks(project_id: impl Into<String>, jwks: JwksManager) -> Self {
        Self::build(project_id.into(), KeySource::Jwks(jwks))
    }

    /// Verifier with one fixed key, for emulators and tests.
    pub fn with_static_key(
        project_id: impl Into<String>,
        key: DecodingKey,
        algorithm: Algorithm,
    ) -> Self {
        Self::build(project_id.into(), KeySource::Static { key, algorithm })
    }

    fn build(project_id: String, keys: KeySource) -> Self {
        Self {
            issuer: format!("{FIREBASE_ISSUER_PREFIX}{project_id}"),
            project_id,
            keys,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    async fn decoding_key(
        &self,
        kid: Option<&str>,
    ) -> Result<(DecodingKey, Algorithm), ProviderError> {
        match (&self.keys, kid) {
            (KeySource::Jwks(jwks), Some(kid)) => jwks.get_decoding_key(kid).await,
            (KeySource::Jwks(jwks), None) => jwks.get_any_decoding_key().await,
            (KeySource::Static { key, algorithm }, _) => Ok((key.clone(), *algorithm)),
        }
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.project_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn verify_id_token(&self, token: &str) -> Result<ClaimSet, ProviderError> {
        let header = decode_header(token).map_err(|_| ProviderError::MalformedToken)?;
        let (key, algorithm) = self.decoding_key(header.kid.as_deref()).await?;

        let token_data = decode::<ClaimSet>(token, &key, &self.validation(algorithm))?;
        let claims = token_data.claims;

        if claims.subject().is_none_or(str::is_empty) {
            return Err(ProviderError::MissingSubject);
        }

        Ok(claims)
    }
}

/// Decodes tokens without verifying the signature.
///
/// WARNING: development only. Checks nothing but `exp`.
#[cfg(feature = "dev")]
#[derive(Debug, Default, Clone, Copy)]
pub struct InsecureProvider;

#[cfg(feature = "dev")]
#[async_trait]
impl IdentityProvider for InsecureProvider {
    async fn verify_id_token(&self, token: &str) -> Result<ClaimSet, ProviderError> {
        let token_data = jsonwebtoken::dangerous::insecure_decode::<ClaimSet>(token)
            .map_err(|_| ProviderError::MalformedToken)?;
        let claims = token_data.claims;

        let cutoff = chrono::Utc::now() - chrono::Duration::seconds(CLOCK_SKEW_LEEWAY as i64);
        if claims.expires_at().is_some_and(|exp| exp < cutoff) {
            return Err(ProviderError::TokenExpired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    const SECRET: &[u8] = b"emulator-secret";
    const PROJECT: &str = "demo-project";

    fn provider() -> FirebaseAuth {
        FirebaseAuth::with_static_key(PROJECT, DecodingKey::from_secret(SECRET), Algorithm::HS256)
    }

    fn claims(overrides: Value) -> Value {
        let now = chrono::Utc::now().timestamp();
        let mut base = json!({
            "sub": "user_123",
            "iss": format!("{FIREBASE_ISSUER_PREFIX}{PROJECT}"),
            "aud": PROJECT,
            "iat": now,
            "exp": now + 3600,
            "email": "ada@example.com",
            "email_verified": true,
        });
        if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
            for (k, v) in overrides {
                base.insert(k.clone(), v.clone());
            }
        }
        base
    }

    fn sign(claims: &Value, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn issuer_derived_from_project() {
        let auth = provider();
        assert_eq!(auth.project_id(), PROJECT);
        assert_eq!(auth.issuer(), "https://securetoken.google.com/demo-project");
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let token = sign(&claims(json!({})), SECRET);
        let verified = provider().verify_id_token(&token).await.unwrap();
        assert_eq!(verified.subject(), Some("user_123"));
        assert!(verified.email_verified());
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let result = provider().verify_id_token("not-a-jwt").await;
        assert!(matches!(result, Err(ProviderError::MalformedToken)));
    }

    #[tokio::test]
    async fn rejects_wrong_signature() {
        let token = sign(&claims(json!({})), b"someone-else");
        let result = provider().verify_id_token(&token).await;
        assert!(matches!(result, Err(ProviderError::InvalidSignature)));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let past = chrono::Utc::now().timestamp() - 3600;
        let token = sign(&claims(json!({ "exp": past })), SECRET);
        let result = provider().verify_id_token(&token).await;
        assert!(matches!(result, Err(ProviderError::TokenExpired)));
    }

    #[tokio::test]
    async fn rejects_other_project() {
        let token = sign(&claims(json!({ "aud": "other-project" })), SECRET);
        let result = provider().verify_id_token(&token).await;
        assert!(matches!(result, Err(ProviderError::InvalidAudience)));
    }

    #[tokio::test]
    async fn rejects_foreign_issuer() {
        let token = sign(
            &claims(json!({ "iss": "https://securetoken.google.com/other-project" })),
            SECRET,
        );
        let result = provider().verify_id_token(&token).await;
        assert!(matches!(result, Err(ProviderError::InvalidIssuer)));
    }

    #[tokio::test]
    async fn rejects_empty_subject() {
        let token = sign(&claims(json!({ "sub": "" })), SECRET);
        let result = provider().verify_id_token(&token).await;
        assert!(matches!(result, Err(ProviderError::MissingSubject)));
    }

    #[cfg(feature = "dev")]
    fn unsigned(claims: &Value) -> String {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{body}.fake_signature")
    }

    #[cfg(feature = "dev")]
    #[tokio::test]
    async fn insecure_provider_skips_signature() {
        let token = unsigned(&claims(json!({})));
        let verified = InsecureProvider.verify_id_token(&token).await.unwrap();
        assert_eq!(verified.subject(), Some("user_123"));
    }

    #[cfg(feature = "dev")]
    #[tokio::test]
    async fn insecure_provider_still_checks_expiry() {
        let past = chrono::Utc::now().timestamp() - 3600;
        let token = unsigned(&claims(json!({ "exp": past })));
        let result = InsecureProvider.verify_id_token(&token).await;
        assert!(matches!(result, Err(ProviderError::TokenExpired)));
    }
}
