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

//! Locating and writing the well-known credential file shared with other
//! tooling.

use crate::Result;
use crate::credentials::TokenCredential;
use crate::errors::CredentialError;
use std::path::PathBuf;

const WINDOWS_APPDATA: &str = "APPDATA";
const UNIX_HOME: &str = "HOME";
const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// Returns the path other tooling reads default credentials from.
pub fn well_known_file() -> Result<PathBuf> {
    let mut path = PathBuf::new();
    if cfg!(windows) {
        if let Ok(appdata) = std::env::var(WINDOWS_APPDATA) {
            path.push(appdata);
        } else {
            return Err(CredentialError::Other("unable to find APPDATA".into()));
        }
    } else if let Ok(home) = std::env::var(UNIX_HOME) {
        path.push(home);
        path.push(".config");
    } else {
        return Err(CredentialError::Other("unable to lookup HOME".into()));
    }

    path.push("gcloud");
    path.push(WELL_KNOWN_FILE);
    Ok(path)
}

/// Saves a credential's portable description to `path`, or to
/// [well_known_file] when `path` is `None`.
///
/// The description is produced before any filesystem access, so
/// credential types that cannot be persisted fail with
/// [CredentialError::NotSupported] without touching the target. The
/// target directory must already exist.
pub fn save_to_well_known_file(
    credential: &dyn TokenCredential,
    path: Option<PathBuf>,
) -> Result<()> {
    let data = credential.serialization_data()?;
    let path = match path {
        Some(path) => path,
        None => well_known_file()?,
    };
    if let Some(parent) = path.parent() {
        if !parent.is_dir() {
            return Err(CredentialError::Other(format!(
                "credential directory does not exist: {}",
                parent.display()
            )));
        }
    }
    std::fs::write(&path, serde_json::to_string_pretty(&data)?)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::credentials::metadata::Builder;
    use crate::transport::Transport;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use scoped_env::ScopedEnv;

    #[cfg(not(windows))]
    #[test]
    #[serial_test::serial]
    fn well_known_file_honors_home() {
        let _home = ScopedEnv::set("HOME", "/test-only/home");
        let path = well_known_file().unwrap();
        assert_eq!(
            path,
            PathBuf::from("/test-only/home/.config/gcloud/application_default_credentials.json")
        );
    }

    #[cfg(not(windows))]
    #[test]
    #[serial_test::serial]
    fn well_known_file_requires_home() {
        let _home = ScopedEnv::remove("HOME");
        let e = well_known_file().err().unwrap();
        assert!(e.to_string().contains("HOME"), "{e}");
    }

    #[test]
    fn metadata_credentials_cannot_be_saved() {
        // Fails before any filesystem access, so no environment or
        // directory setup is needed.
        let credential = Builder::default().build();
        let e = save_to_well_known_file(&credential, None).err().unwrap();
        assert!(matches!(e, CredentialError::NotSupported(_)));
    }

    #[derive(Debug)]
    struct FakeCredential;

    #[async_trait]
    impl TokenCredential for FakeCredential {
        async fn refresh(&mut self, _transport: &dyn Transport) -> crate::Result<()> {
            Ok(())
        }

        fn token(&self) -> Option<&str> {
            Some("token-test-only")
        }

        fn token_expiry(&self) -> Option<DateTime<Utc>> {
            None
        }

        fn requires_scopes(&self) -> bool {
            false
        }

        fn scoped(&self, _scopes: Vec<String>) -> Box<dyn TokenCredential> {
            Box::new(FakeCredential)
        }

        fn serialization_data(&self) -> crate::Result<serde_json::Value> {
            Ok(serde_json::json!({
                "type": "fake",
                "refresh_token": "refresh-test-only",
            }))
        }

        fn to_json(&self) -> crate::Result<String> {
            Ok("{}".into())
        }
    }

    #[test]
    fn save_writes_serialization_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        save_to_well_known_file(&FakeCredential, Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["refresh_token"], "refresh-test-only");
    }

    #[test]
    fn save_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("credentials.json");
        let e = save_to_well_known_file(&FakeCredential, Some(path)).err().unwrap();
        assert!(e.to_string().contains("does not exist"), "{e}");
    }
}
