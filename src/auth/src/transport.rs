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

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use reqwest::Client;

const USER_AGENT: &str = concat!("gce-metadata-auth/", env!("CARGO_PKG_VERSION"));

/// Issues HTTP requests on behalf of a credential.
///
/// A credential performs exactly one `request` call per refresh. The
/// transport owns connection reuse, timeouts, and proxy behavior; the
/// credential owns interpreting the status code and body. Injecting the
/// transport is also what keeps the refresh protocol testable, since the
/// metadata URL itself is fixed.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Issues a single GET request and returns the response status and
    /// raw body.
    ///
    /// Non-success statuses are returned to the caller, not turned into
    /// errors; only transport-level failures (connect, timeout) error.
    async fn request(&self, url: &str, headers: &HeaderMap) -> Result<(StatusCode, Bytes)>;
}

/// The default [Transport], backed by a reqwest [Client].
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a client identified to the metadata
    /// server by this crate's user agent.
    pub fn new() -> Self {
        let client = Client::builder().user_agent(USER_AGENT).build().unwrap();
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, url: &str, headers: &HeaderMap) -> Result<(StatusCode, Bytes)> {
        let response = self.client.get(url).headers(headers.clone()).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    // Used by tests in other modules.
    mockall::mock! {
        #[derive(Debug)]
        pub Transport { }

        #[async_trait]
        impl Transport for Transport {
            async fn request(&self, url: &str, headers: &HeaderMap) -> Result<(StatusCode, Bytes)>;
        }
    }
}
