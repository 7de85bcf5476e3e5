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

/// An access token together with its remaining lifetime, when one is
/// known.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token used in `Authorization:` headers.
    pub access_token: String,

    /// Seconds until the token expires.
    ///
    /// `None` when the token source does not report a lifetime. The
    /// metadata server manages expiry on the instance's behalf, so tokens
    /// minted from it always carry `None` here.
    pub expires_in: Option<i64>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[censored]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn debug_censors_token() {
        let token = AccessToken {
            access_token: "token-test-only".into(),
            expires_in: Some(3600),
        };
        let got = format!("{token:?}");
        assert!(!got.contains("token-test-only"), "{got}");
        assert!(got.contains("[censored]"), "{got}");
        assert!(got.contains("3600"), "{got}");
    }
}
