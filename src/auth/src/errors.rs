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

use http::StatusCode;

/// Represents an error creating, refreshing, or persisting a credential.
#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    /// The token refresh failed or its response was unusable.
    #[error(transparent)]
    Refresh(#[from] AccessTokenRefreshError),
    /// The operation is not implemented for this credential type.
    #[error("{0} is not supported by this credential type")]
    NotSupported(&'static str),
    /// A persisted credential document could not be produced or parsed.
    #[error("unable to serialize or deserialize credential")]
    Serde(#[from] serde_json::Error),
    /// The transport failed before producing an HTTP status.
    #[error("unable to process request")]
    Http(#[from] reqwest::Error),
    /// Reading or writing a credential file failed.
    #[error("unable to access credential file")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

pub(crate) const NO_SERVICE_ACCOUNT_HINT: &str =
    " This can occur if a VM was created with no service account or scopes.";

/// A failure to mint a new access token from the metadata server.
///
/// The `Display` form is the raw response body, best-effort decoded to
/// text, so operators see exactly what the server said. [kind] and
/// [is_retryable] classify the failure for programmatic handling.
///
/// [kind]: AccessTokenRefreshError::kind
/// [is_retryable]: AccessTokenRefreshError::is_retryable
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct AccessTokenRefreshError {
    kind: RefreshErrorKind,
    message: String,
    retryable: bool,
}

/// Why a token refresh failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshErrorKind {
    /// The server replied 200 but the body was not a valid token payload.
    MalformedResponse,
    /// The server rejected the request with a non-200 status.
    Rejected,
    /// The server replied 404: the instance has no service account
    /// attached, so there is no identity to mint tokens for.
    NoServiceAccount,
}

impl AccessTokenRefreshError {
    pub(crate) fn malformed<T: Into<String>>(body: T) -> Self {
        Self {
            kind: RefreshErrorKind::MalformedResponse,
            message: body.into(),
            retryable: false,
        }
    }

    pub(crate) fn rejected<T: Into<String>>(status: StatusCode, body: T) -> Self {
        Self {
            kind: RefreshErrorKind::Rejected,
            message: body.into(),
            retryable: is_retryable(status),
        }
    }

    pub(crate) fn no_service_account<T: Into<String>>(body: T) -> Self {
        let mut message = body.into();
        message.push_str(NO_SERVICE_ACCOUNT_HINT);
        Self {
            kind: RefreshErrorKind::NoServiceAccount,
            message,
            retryable: false,
        }
    }

    /// Which failure class this error belongs to.
    pub fn kind(&self) -> RefreshErrorKind {
        self.kind
    }

    /// If `true`, a later refresh against the same endpoint may succeed.
    ///
    /// Nothing is retried internally; this is input to the caller's retry
    /// loop.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

pub(crate) fn is_retryable(c: StatusCode) -> bool {
    match c {
        // Internal server errors do not indicate that there is anything
        // wrong with our request, so we retry them.
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS => true,
        _ => false,
    }
}
