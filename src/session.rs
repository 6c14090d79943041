//! Session context carried into every component that talks to the backend.
//!
//! The credential is an explicit value rather than an ambient lookup, and the
//! "not signed in" case is its own variant so callers fail before any request.

use std::fmt;
use std::path::Path;

use crate::error::{Result, ShiftsyncError};

/// Environment variable checked for a bearer token when none is configured.
pub const DEFAULT_TOKEN_ENV: &str = "SHIFTSYNC_TOKEN";

/// Bearer credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Authenticated { token: BearerToken },
    Anonymous,
}

impl Session {
    /// Session for a known token; blank tokens count as no session.
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            Session::Anonymous
        } else {
            Session::Authenticated {
                token: BearerToken::new(token),
            }
        }
    }

    /// Read the token from `env_var`, falling back to the first line of `token_file`.
    pub fn discover(env_var: &str, token_file: Option<&Path>) -> Result<Self> {
        if let Ok(token) = std::env::var(env_var) {
            let session = Self::with_token(token);
            if session.is_authenticated() {
                log::debug!("Using bearer token from ${}", env_var);
                return Ok(session);
            }
        }

        if let Some(path) = token_file {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let first_line = content.lines().next().unwrap_or_default();
                log::debug!("Using bearer token from {}", path.display());
                return Ok(Self::with_token(first_line));
            }
        }

        log::info!("No bearer token found, session is anonymous");
        Ok(Session::Anonymous)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    /// The bearer token, or `NoSession` before anything touches the network.
    pub fn token(&self) -> Result<&BearerToken> {
        match self {
            Session::Authenticated { token } => Ok(token),
            Session::Anonymous => Err(ShiftsyncError::NoSession),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_blank_token_is_anonymous() {
        assert_eq!(Session::with_token("   "), Session::Anonymous);
        assert!(matches!(Session::Anonymous.token(), Err(ShiftsyncError::NoSession)));
    }

    #[test]
    fn test_token_header_value() {
        let session = Session::with_token("abc123\n");
        let token = session.token().unwrap();
        assert_eq!(token.header_value(), "Bearer abc123");
    }

    #[test]
    fn test_debug_hides_token() {
        let session = Session::with_token("super-secret");
        let debug = format!("{:?}", session);
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_discover_from_token_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "file-token").unwrap();
        writeln!(file, "ignored").unwrap();

        let session = Session::discover("SHIFTSYNC_TEST_UNSET_VAR_1", Some(file.path())).unwrap();
        assert_eq!(session.token().unwrap().as_str(), "file-token");
    }

    #[test]
    fn test_discover_nothing_found() {
        let session = Session::discover(
            "SHIFTSYNC_TEST_UNSET_VAR_2",
            Some(Path::new("/definitely/not/here/token")),
        )
        .unwrap();
        assert_eq!(session, Session::Anonymous);
    }
}
