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

//! Access token credentials minted by the compute-instance metadata
//! service.
//!
//! Virtualized compute environments run a local metadata endpoint that
//! serves, among other instance attributes, access tokens for the service
//! account attached to the instance. This crate obtains, caches, and
//! refreshes those tokens so a process can authenticate with
//! OAuth2-protected APIs without key files or an interactive
//! authorization flow.
//!
//! The entry point is [credentials::metadata::Builder]. The resulting
//! credential implements [credentials::TokenCredential], which owns the
//! refresh state machine and the serialization contract for persisted
//! credential state. HTTP goes through the injectable
//! [transport::Transport] contract, with [transport::HttpTransport] as
//! the reqwest-backed default.

/// Error types and the retryability classification of refresh failures.
pub mod errors;

/// The generic credential contract and the metadata-server credential.
pub mod credentials;

/// The access token value type returned to callers.
pub mod token;

/// The HTTP transport contract credentials issue requests through.
pub mod transport;

/// Locating and writing the well-known credential file.
pub mod well_known;

/// A `Result` alias where the `Err` case is
/// `gce_metadata_auth::errors::CredentialError`.
pub type Result<T> = std::result::Result<T, errors::CredentialError>;
