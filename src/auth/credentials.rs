//! Durable persistence of the bearer token.
//!
//! The session machine only needs one durable key: the token string itself.
//! `TokenStore` abstracts where that key lives so tests can use an
//! in-memory store; production code picks the OS keychain where one is
//! available and falls back to a JSON file in the config directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};

const SERVICE_NAME: &str = "spendtrack";
const TOKEN_ACCOUNT: &str = "bearer-token";

/// Token file name inside the config directory
const TOKEN_FILE: &str = "token.json";

pub trait TokenStore {
    /// The persisted token, or `None` when the caller starts Anonymous.
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, token: &str) -> Result<()>;

    /// Remove the persisted token. Clearing an absent token is not an error.
    fn clear(&self) -> Result<()>;
}

/// Token storage in the OS keychain.
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_ACCOUNT).context("Failed to create keyring entry")
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token from keychain"),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedToken {
    token: String,
}

/// Token storage as a JSON file, for headless environments without a
/// usable keychain.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read token file")?;
        let persisted: PersistedToken =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        Ok(Some(persisted.token))
    }

    fn save(&self, token: &str) -> Result<()> {
        let path = self.token_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&PersistedToken {
            token: token.to_string(),
        })?;
        std::fs::write(path, contents).context("Failed to write token file")
    }

    fn clear(&self) -> Result<()> {
        let path = self.token_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().to_path_buf());

        assert_eq!(store.load().unwrap(), None);

        store.save("tok-123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-123"));

        store.save("tok-456").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-456"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().to_path_buf());
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested"));
        store.save("tok").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok"));
    }
}
