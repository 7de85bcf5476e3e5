// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The contract shared by every credential type, and the factory that
//! reconstructs a concrete credential from its persisted JSON form.

pub mod metadata;

use crate::Result;
use crate::errors::CredentialError;
use crate::token::AccessToken;
use crate::transport::Transport;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Discriminator for [metadata::MetadataCredential] in the persisted
/// form.
pub(crate) const METADATA_CREDENTIAL_TYPE: &str = "metadata";

/// Operations common to every credential type.
///
/// Token state lives on the credential and is mutated in place by
/// [refresh][TokenCredential::refresh]. The `&mut self` receivers are
/// what rules out unsynchronized concurrent refreshes; callers sharing a
/// credential across tasks must serialize access themselves.
#[async_trait]
pub trait TokenCredential: Send + Sync + std::fmt::Debug {
    /// Mints a new access token, replacing any cached one.
    async fn refresh(&mut self, transport: &dyn Transport) -> Result<()>;

    /// The currently cached bearer token, if any.
    fn token(&self) -> Option<&str>;

    /// When the cached token stops being usable, if known.
    fn token_expiry(&self) -> Option<DateTime<Utc>>;

    /// Whether the cached token is past its expiry.
    ///
    /// A token without an expiry never expires client-side; its source is
    /// expected to keep it usable or reject it on use.
    fn expired(&self) -> bool {
        match self.token_expiry() {
            // Allow 10 seconds of clock skew.
            Some(expiry) => expiry - Duration::seconds(10) <= Utc::now(),
            None => false,
        }
    }

    /// Returns a valid access token, refreshing first when the cache is
    /// empty or expired.
    async fn access_token(&mut self, transport: &dyn Transport) -> Result<AccessToken> {
        if self.token().is_none() || self.expired() {
            self.refresh(transport).await?;
        }
        let access_token = self
            .token()
            .ok_or_else(|| CredentialError::Other("refresh did not produce a token".into()))?
            .to_string();
        let expires_in = self.token_expiry().map(|t| (t - Utc::now()).num_seconds());
        Ok(AccessToken {
            access_token,
            expires_in,
        })
    }

    /// Whether this credential must be rescoped before it can be used.
    fn requires_scopes(&self) -> bool;

    /// A new, independent credential bound to `scopes`.
    ///
    /// Token state is not carried over; the new credential starts
    /// unrefreshed.
    fn scoped(&self, scopes: Vec<String>) -> Box<dyn TokenCredential>;

    /// The portable description consumed by the well-known-file helpers.
    ///
    /// Fails with [CredentialError::NotSupported] for credential types
    /// with no secret material to persist.
    fn serialization_data(&self) -> Result<serde_json::Value>;

    /// Serializes the credential, token state included, to the JSON form
    /// understood by [from_json].
    fn to_json(&self) -> Result<String>;
}

/// The JSON document shape shared by every persisted credential.
///
/// `type` selects the concrete credential in [from_json]; the remaining
/// fields are the lowest common denominator of credential state. Only
/// `access_token` is guaranteed to survive a save/load cycle unchanged.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct PersistedCredential {
    #[serde(rename = "type")]
    pub cred_type: String,
    pub access_token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scope: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Reconstructs a credential from its [to_json][TokenCredential::to_json]
/// form.
///
/// The discriminator is validated against the closed set of credential
/// types this crate knows how to build.
pub fn from_json(data: &str) -> Result<Box<dyn TokenCredential>> {
    let doc: PersistedCredential = serde_json::from_str(data)?;
    match doc.cred_type.as_str() {
        METADATA_CREDENTIAL_TYPE => Ok(Box::new(metadata::MetadataCredential::from_persisted(doc))),
        other => Err(CredentialError::Other(format!(
            "unsupported credential type found: {other}"
        ))),
    }
}

/// Receives non-fatal advisories raised while configuring credentials.
///
/// Advisories flag configuration that is accepted but has no effect; they
/// never abort the operation that raised them. The default sink forwards
/// to [tracing]; tests install their own sink to assert on what was
/// emitted.
pub trait AdvisorySink: Send + Sync {
    /// The requested scopes will have no effect on minted tokens.
    fn scopes_ignored(&self, message: &str);
}

/// The default [AdvisorySink]: forwards advisories as warnings.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAdvisorySink;

impl AdvisorySink for TracingAdvisorySink {
    fn scopes_ignored(&self, message: &str) {
        tracing::warn!("{message}");
    }
}
