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

//! Credentials backed by the compute-instance metadata service.
//!
//! Virtualized compute environments expose a link-local metadata endpoint
//! that serves access tokens for the service account attached to the
//! instance. A process running on such an instance can authenticate
//! without downloading secrets or walking a user through an authorization
//! flow: it asks the metadata server for a token and uses it until the
//! server stops honoring it.
//!
//! Example usage:
//!
//! ```no_run
//! # use gce_metadata_auth::credentials::metadata::Builder;
//! # use gce_metadata_auth::credentials::TokenCredential;
//! # use gce_metadata_auth::transport::HttpTransport;
//! # async fn sample() -> gce_metadata_auth::Result<()> {
//! let transport = HttpTransport::new();
//! let mut credential = Builder::default().build();
//! let token = credential.access_token(&transport).await?;
//! println!("Token: {}", token.access_token);
//! # Ok(())
//! # }
//! ```

use crate::Result;
use crate::credentials::{
    AdvisorySink, METADATA_CREDENTIAL_TYPE, PersistedCredential, TokenCredential,
    TracingAdvisorySink,
};
use crate::errors::{AccessTokenRefreshError, CredentialError};
use crate::transport::Transport;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

/// The only URL tokens are ever requested from. The host is link-local;
/// requests never leave the instance.
pub(crate) const METADATA_TOKEN_URI: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const METADATA_FLAVOR: &str = "metadata-flavor";
const METADATA_FLAVOR_VALUE: &str = "Google";

/// Emitted through the [AdvisorySink] whenever explicit scopes are
/// configured on a metadata credential.
pub const SCOPES_ADVISORY: &str = "explicit scopes have no effect on metadata-server tokens; \
     token scopes are fixed when the instance is created and cannot be overridden per request";

/// Creates [MetadataCredential] instances.
///
/// No builder method performs network I/O; the first request happens on
/// [refresh][TokenCredential::refresh].
pub struct Builder {
    scope: String,
    params: serde_json::Map<String, serde_json::Value>,
    advisories: Arc<dyn AdvisorySink>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            scope: String::new(),
            params: serde_json::Map::new(),
            advisories: Arc::new(TracingAdvisorySink),
        }
    }
}

impl Builder {
    /// Sets the requested scope string verbatim.
    ///
    /// Scopes are accepted for interface symmetry with credential types
    /// that honor them; the metadata server ignores them (see
    /// [SCOPES_ADVISORY]).
    pub fn scope<S: Into<String>>(mut self, scope: S) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the requested scopes, normalized to one space-joined string.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scopes
            .into_iter()
            .map(|s| s.into())
            .collect::<Vec<_>>()
            .join(" ");
        self
    }

    /// Attaches an opaque construction parameter.
    ///
    /// Parameters are never interpreted by the credential. They are
    /// preserved across [scoped][TokenCredential::scoped] copies and in
    /// the persisted form, so integrations can carry their own settings
    /// alongside the credential.
    pub fn param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Replaces the whole parameter bag.
    pub fn params(mut self, params: serde_json::Map<String, serde_json::Value>) -> Self {
        self.params = params;
        self
    }

    /// Replaces the advisory sink. Defaults to [TracingAdvisorySink].
    pub fn advisories(mut self, sink: Arc<dyn AdvisorySink>) -> Self {
        self.advisories = sink;
        self
    }

    /// Returns a [MetadataCredential] with the configured settings.
    ///
    /// Emits [SCOPES_ADVISORY] exactly once when the normalized scope is
    /// non-empty.
    pub fn build(self) -> MetadataCredential {
        let credential = MetadataCredential {
            scope: self.scope,
            access_token: None,
            token_expiry: None,
            params: self.params,
            assertion_type: None,
            advisories: self.advisories,
        };
        if !credential.scope.is_empty() {
            credential.advisories.scopes_ignored(SCOPES_ADVISORY);
        }
        credential
    }
}

/// A credential whose tokens come from the instance metadata server.
///
/// The token already exists on the server side, scoped and rotated by the
/// platform; this type only fetches and caches it. Consequently there is
/// no secret material to persist
/// ([serialization_data][TokenCredential::serialization_data] fails with
/// [CredentialError::NotSupported]) and no client-side expiry tracking:
/// the metadata server serves a fresh token when the old one lapses.
pub struct MetadataCredential {
    scope: String,
    access_token: Option<String>,
    token_expiry: Option<DateTime<Utc>>,
    params: serde_json::Map<String, serde_json::Value>,
    // Metadata tokens are not assertion-based; present for parity with
    // assertion credential types.
    assertion_type: Option<String>,
    advisories: Arc<dyn AdvisorySink>,
}

impl std::fmt::Debug for MetadataCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCredential")
            .field("scope", &self.scope)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[censored]"),
            )
            .field("token_expiry", &self.token_expiry)
            .field("params", &self.params)
            .field("assertion_type", &self.assertion_type)
            .finish_non_exhaustive()
    }
}

/// The shape of the metadata server's token response. Extra fields are
/// ignored.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl MetadataCredential {
    /// The normalized scope string. Empty when no scope was requested.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The opaque construction parameters.
    pub fn params(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.params
    }

    /// Always `None`: metadata credentials do not use assertion flows.
    pub fn assertion_type(&self) -> Option<&str> {
        self.assertion_type.as_deref()
    }

    /// A new credential bound to `scopes`, sharing the construction
    /// parameters and advisory sink but not the token state.
    pub fn rescope<I, S>(&self, scopes: I) -> MetadataCredential
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Builder::default()
            .scopes(scopes)
            .params(self.params.clone())
            .advisories(self.advisories.clone())
            .build()
    }

    pub(crate) fn from_persisted(doc: PersistedCredential) -> Self {
        // Reconstruction is not a scope-changing operation, so no
        // advisory is emitted here.
        Self {
            scope: doc.scope,
            access_token: doc.access_token,
            token_expiry: doc.token_expiry,
            params: doc.params,
            assertion_type: None,
            advisories: Arc::new(TracingAdvisorySink),
        }
    }
}

#[async_trait]
impl TokenCredential for MetadataCredential {
    async fn refresh(&mut self, transport: &dyn Transport) -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(METADATA_FLAVOR, HeaderValue::from_static(METADATA_FLAVOR_VALUE));
        let (status, body) = transport.request(METADATA_TOKEN_URI, &headers).await?;
        let body = String::from_utf8_lossy(&body).into_owned();
        if status != StatusCode::OK {
            if status == StatusCode::NOT_FOUND {
                return Err(AccessTokenRefreshError::no_service_account(body).into());
            }
            return Err(AccessTokenRefreshError::rejected(status, body).into());
        }
        let payload = serde_json::from_str::<TokenResponse>(&body)
            .map_err(|_| AccessTokenRefreshError::malformed(body))?;
        self.access_token = Some(payload.access_token);
        // The response carries no expiry; the server hands out a fresh
        // token when this one lapses.
        self.token_expiry = None;
        Ok(())
    }

    fn token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn token_expiry(&self) -> Option<DateTime<Utc>> {
        self.token_expiry
    }

    fn requires_scopes(&self) -> bool {
        if !self.scope.is_empty() {
            self.advisories.scopes_ignored(SCOPES_ADVISORY);
        }
        false
    }

    fn scoped(&self, scopes: Vec<String>) -> Box<dyn TokenCredential> {
        Box::new(self.rescope(scopes))
    }

    fn serialization_data(&self) -> Result<serde_json::Value> {
        // There is no client secret or refresh token behind a metadata
        // credential; nothing portable exists to describe it.
        Err(CredentialError::NotSupported("serialization"))
    }

    fn to_json(&self) -> Result<String> {
        let doc = PersistedCredential {
            cred_type: METADATA_CREDENTIAL_TYPE.to_string(),
            access_token: self.access_token.clone(),
            token_expiry: self.token_expiry,
            scope: self.scope.clone(),
            params: self.params.clone(),
        };
        Ok(serde_json::to_string(&doc)?)
    }
}
