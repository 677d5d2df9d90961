//! Permanent token table
//!
//! Tokens come from the `[[auth.tokens]]` configuration table and from an
//! optional TOML file with the same `[[tokens]]` layout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;

use super::{AuthError, Authenticator, Principal};

/// A single permanent token
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    pub token: String,
    /// Principal identifier bound to requests using this token
    pub principal: String,
    /// Token is rejected after this instant
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    /// When non-empty, only these remote addresses may use the token
    #[serde(default)]
    pub ip_restriction: Vec<IpAddr>,
}

#[derive(Debug, Deserialize)]
struct TokensFile {
    #[serde(default)]
    tokens: Vec<TokenEntry>,
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("Failed to read tokens file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse tokens file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("Duplicate token for principal '{principal}'")]
    Duplicate { principal: String },
}

/// In-memory token lookup table
#[derive(Debug, Default)]
pub struct TokenTable {
    entries: HashMap<String, TokenEntry>,
}

impl TokenTable {
    pub fn new(entries: impl IntoIterator<Item = TokenEntry>) -> Result<Self, TokenStoreError> {
        let mut table = Self::default();
        for entry in entries {
            table.insert(entry)?;
        }
        Ok(table)
    }

    /// Build from inline entries plus an optional tokens file
    pub fn load(
        inline: &[TokenEntry],
        tokens_file: Option<&str>,
    ) -> Result<Self, TokenStoreError> {
        let mut table = Self::new(inline.iter().cloned())?;
        if let Some(path) = tokens_file {
            for entry in read_tokens_file(Path::new(path))? {
                table.insert(entry)?;
            }
        }
        Ok(table)
    }

    fn insert(&mut self, entry: TokenEntry) -> Result<(), TokenStoreError> {
        if self.entries.contains_key(&entry.token) {
            return Err(TokenStoreError::Duplicate {
                principal: entry.principal,
            });
        }
        self.entries.insert(entry.token.clone(), entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(
        &self,
        token: &str,
        remote_addr: Option<IpAddr>,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        let entry = self.entries.get(token).ok_or(AuthError::InvalidToken)?;

        if let Some(valid_until) = entry.valid_until {
            if valid_until < now {
                return Err(AuthError::Expired {
                    valid_until: valid_until.to_rfc3339(),
                });
            }
        }

        if !entry.ip_restriction.is_empty() {
            let allowed = remote_addr.is_some_and(|addr| entry.ip_restriction.contains(&addr));
            if !allowed {
                return Err(AuthError::IpRestricted { remote_addr });
            }
        }

        Ok(Principal::new(entry.principal.clone()))
    }
}

#[async_trait]
impl Authenticator for TokenTable {
    async fn authenticate(
        &self,
        token: &str,
        remote_addr: Option<IpAddr>,
    ) -> Result<Principal, AuthError> {
        self.check(token, remote_addr, Utc::now())
    }
}

fn read_tokens_file(path: &Path) -> Result<Vec<TokenEntry>, TokenStoreError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| TokenStoreError::Read {
        path: display.clone(),
        source,
    })?;
    let file: TokensFile = toml::from_str(&content).map_err(|source| TokenStoreError::Parse {
        path: display,
        source,
    })?;
    Ok(file.tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(token: &str, principal: &str) -> TokenEntry {
        TokenEntry {
            token: token.to_string(),
            principal: principal.to_string(),
            valid_until: None,
            ip_restriction: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_known_token() {
        let table = TokenTable::new([entry("validtoken123", "42")]).unwrap();
        let principal = table.authenticate("validtoken123", None).await.unwrap();
        assert_eq!(principal, Principal::new("42"));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let table = TokenTable::new([entry("validtoken123", "42")]).unwrap();
        assert_eq!(
            table.authenticate("nope", None).await,
            Err(AuthError::InvalidToken)
        );
        // Comparison is exact on the raw header value
        assert_eq!(
            table.authenticate("Bearer validtoken123", None).await,
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_expired_token() {
        let now = Utc::now();
        let mut e = entry("old", "7");
        e.valid_until = Some(now - Duration::hours(1));
        let table = TokenTable::new([e]).unwrap();

        let err = table.check("old", None, now).unwrap_err();
        assert_eq!(err.error_code(), "invalidtimedtoken");
    }

    #[test]
    fn test_not_yet_expired_token() {
        let now = Utc::now();
        let mut e = entry("fresh", "7");
        e.valid_until = Some(now + Duration::hours(1));
        let table = TokenTable::new([e]).unwrap();

        assert!(table.check("fresh", None, now).is_ok());
    }

    #[test]
    fn test_ip_restriction() {
        let mut e = entry("restricted", "9");
        e.ip_restriction = vec!["127.0.0.1".parse().unwrap(), "::1".parse().unwrap()];
        let table = TokenTable::new([e]).unwrap();
        let now = Utc::now();

        assert!(table
            .check("restricted", Some("127.0.0.1".parse().unwrap()), now)
            .is_ok());
        assert!(table
            .check("restricted", Some("::1".parse().unwrap()), now)
            .is_ok());
        assert_eq!(
            table
                .check("restricted", Some("10.0.0.1".parse().unwrap()), now)
                .unwrap_err()
                .error_code(),
            "invalidiptoken"
        );
        assert!(table.check("restricted", None, now).is_err());
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let result = TokenTable::new([entry("same", "1"), entry("same", "2")]);
        assert!(matches!(result, Err(TokenStoreError::Duplicate { .. })));
    }

    #[test]
    fn test_load_tokens_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.toml");
        std::fs::write(
            &path,
            r#"
[[tokens]]
token = "filetoken"
principal = "100"
valid_until = "2999-01-01T00:00:00Z"
ip_restriction = ["192.168.0.10"]
"#,
        )
        .unwrap();

        let table = TokenTable::load(&[entry("inline", "1")], path.to_str()).unwrap();
        assert_eq!(table.len(), 2);
        let principal = table
            .check("filetoken", Some("192.168.0.10".parse().unwrap()), Utc::now())
            .unwrap();
        assert_eq!(principal.id, "100");
    }

    #[test]
    fn test_load_missing_file() {
        let result = TokenTable::load(&[], Some("/nonexistent/bird/tokens.toml"));
        assert!(matches!(result, Err(TokenStoreError::Read { .. })));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.toml");
        std::fs::write(&path, "[[tokens]]\ntoken = 5\n").unwrap();
        let result = TokenTable::load(&[], path.to_str());
        assert!(matches!(result, Err(TokenStoreError::Parse { .. })));
    }
}
