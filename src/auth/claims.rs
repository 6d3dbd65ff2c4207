// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified token claims.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Claim set asserted by the identity provider about the token subject.
///
/// Produced only by a verifier and immutable afterwards. Cloning is cheap,
/// the underlying map is shared.
///
/// Firebase ID tokens carry standard OIDC claims (`sub`, `iss`, `aud`,
/// `exp`, `iat`) plus `email`, `email_verified`, `auth_time` and a
/// `firebase` object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimSet {
    claims: Arc<Map<String, Value>>,
}

impl ClaimSet {
    /// Look up a raw claim.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Subject (`sub`), the provider's canonical user ID.
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.get("email").and_then(Value::as_str)
    }

    /// `true` only when `email_verified` is present and the JSON boolean `true`.
    pub fn email_verified(&self) -> bool {
        matches!(self.get("email_verified"), Some(Value::Bool(true)))
    }

    /// Token expiration (`exp`).
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.get("exp")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.claims.iter()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// The claims as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.claims.as_ref().clone())
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(claims: Map<String, Value>) -> Self {
        Self {
            claims: Arc::new(claims),
        }
    }
}

impl<'de> Deserialize<'de> for ClaimSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for ClaimSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.claims.as_ref().serialize(serializer)
    }
}
