//! Secure handling of the toolkit access token
//!
//! The token is kept in a `secrecy::SecretString` so it never shows up in
//! `Debug` output, and anything echoed back by the toolkit is masked before
//! it reaches logs or error messages.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

/// Environment variable holding the toolkit access token
pub const ACCESS_TOKEN_VAR: &str = "OTA_ACCESS_TOKEN";

/// Secure token manager for toolkit authentication
///
/// # Examples
///
/// ```
/// use ota_publisher::security::SecureTokenManager;
/// use std::collections::HashMap;
///
/// let mut env = HashMap::new();
/// env.insert("OTA_ACCESS_TOKEN".to_string(), "tok_abcdef123456".to_string());
///
/// let manager = SecureTokenManager::from_env(&env);
/// assert!(manager.has_token());
/// assert_eq!(manager.mask_tokens_in_string("bad token tok_abcdef123456"), "bad token tok...456");
/// ```
#[derive(Default)]
pub struct SecureTokenManager {
    token: Option<SecretString>,
}

impl SecureTokenManager {
    /// Read the access token from an environment snapshot
    pub fn from_env(env: &HashMap<String, String>) -> Self {
        let token = env
            .get(ACCESS_TOKEN_VAR)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| SecretString::new(value.into()));

        Self { token }
    }

    /// The access token, if configured
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Checks if a token is configured
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Masks a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters for identification purposes.
    /// Tokens shorter than 10 characters are fully masked as "****".
    pub fn mask_token(token: &str) -> String {
        if token.len() < 10 || !token.is_ascii() {
            return "****".to_string();
        }

        let prefix = &token[..3];
        let suffix = &token[token.len() - 3..];
        format!("{}...{}", prefix, suffix)
    }

    /// Masks the configured token wherever it appears in `text`
    pub fn mask_tokens_in_string(&self, text: &str) -> String {
        match &self.token {
            Some(token) => {
                let raw = token.expose_secret();
                text.replace(raw, &Self::mask_token(raw))
            }
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with_token(token: &str) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert(ACCESS_TOKEN_VAR.to_string(), token.to_string());
        env
    }

    #[test]
    fn test_no_token_when_unset() {
        let manager = SecureTokenManager::from_env(&HashMap::new());
        assert!(!manager.has_token());
        assert!(manager.token().is_none());
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let manager = SecureTokenManager::from_env(&env_with_token("   "));
        assert!(!manager.has_token());
    }

    #[test]
    fn test_token_is_trimmed() {
        let manager = SecureTokenManager::from_env(&env_with_token(" secret-token-value\n"));
        assert_eq!(
            manager.token().unwrap().expose_secret(),
            "secret-token-value"
        );
    }

    #[test]
    fn test_mask_token_with_short_token() {
        assert_eq!(SecureTokenManager::mask_token("short"), "****");
    }

    #[test]
    fn test_mask_token_with_long_token() {
        assert_eq!(SecureTokenManager::mask_token("abcdef123456"), "abc...456");
    }

    #[test]
    fn test_mask_tokens_in_string_without_token() {
        let manager = SecureTokenManager::default();
        assert_eq!(manager.mask_tokens_in_string("nothing here"), "nothing here");
    }

    #[test]
    fn test_mask_tokens_in_string_with_token() {
        let manager = SecureTokenManager::from_env(&env_with_token("abcdef123456"));
        let masked = manager.mask_tokens_in_string("401: token abcdef123456 expired");
        assert_eq!(masked, "401: token abc...456 expired");
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let manager = SecureTokenManager::from_env(&env_with_token("abcdef123456"));
        let debug = format!("{:?}", manager.token().unwrap());
        assert!(!debug.contains("abcdef123456"));
    }
}
