//! Credential check for the report gate.
//!
//! The pipeline entry point requires an authenticated [`Session`] value, so there is
//! no process-wide logged-in flag to get out of sync with the caller.

use chrono::{DateTime, Utc};

use crate::config::AuthConfig;
use crate::error::{ReportError, Result};

/// Proof that the caller presented valid credentials for this run.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub authenticated_at: DateTime<Utc>,
}

/// Check the presented credentials against the configured ones.
///
/// Both username and password must match exactly. Returns [`ReportError::Unauthorized`]
/// on mismatch, without revealing which of the two was wrong.
pub fn authenticate(config: &AuthConfig, username: &str, password: &str) -> Result<Session> {
    let expected_user = config
        .username
        .as_deref()
        .ok_or_else(|| ReportError::Config("auth.username is not configured".to_string()))?;
    let expected_pass = config
        .password
        .as_deref()
        .ok_or_else(|| ReportError::Config("auth.password is not configured".to_string()))?;

    if username != expected_user || password != expected_pass {
        tracing::warn!(username, "Rejected login attempt");
        return Err(ReportError::Unauthorized);
    }

    tracing::info!(username, "Authenticated");
    Ok(Session {
        username: username.to_string(),
        authenticated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            username: Some("surveyor".to_string()),
            password: Some("hunter2".to_string()),
        }
    }

    #[test]
    fn test_valid_credentials() {
        let session = authenticate(&config(), "surveyor", "hunter2").unwrap();
        assert_eq!(session.username, "surveyor");
    }

    #[test]
    fn test_wrong_password() {
        let result = authenticate(&config(), "surveyor", "wrong");
        assert!(matches!(result, Err(ReportError::Unauthorized)));
    }

    #[test]
    fn test_wrong_username() {
        let result = authenticate(&config(), "intruder", "hunter2");
        assert!(matches!(result, Err(ReportError::Unauthorized)));
    }

    #[test]
    fn test_unconfigured_credentials() {
        let config = AuthConfig::default();
        assert!(matches!(
            authenticate(&config, "surveyor", "hunter2"),
            Err(ReportError::Config(_))
        ));
    }
}
