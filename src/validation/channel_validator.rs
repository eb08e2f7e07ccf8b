//! Release channel validation
//!
//! Channel names partition published updates. They must start with a
//! lowercase letter or digit, followed by lowercase letters, digits, `.`,
//! `_` or `-`.
//!
//! # Example
//!
//! ```
//! use ota_publisher::validation::channel_validator::validate_release_channel;
//!
//! assert!(validate_release_channel("beta-1").is_ok());
//! assert!(validate_release_channel("Invalid Channel!").is_err());
//! ```

use crate::core::error::PublishError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CHANNEL_RE: Regex = Regex::new(r"^[a-z0-9][a-z0-9._-]*$").unwrap();
}

/// Check whether `channel` is an acceptable release channel name
pub fn is_valid_release_channel(channel: &str) -> bool {
    CHANNEL_RE.is_match(channel)
}

/// Validate a release channel name
///
/// # Errors
///
/// Returns [`PublishError::InvalidReleaseChannel`] when the name does not
/// match the channel pattern.
pub fn validate_release_channel(channel: &str) -> Result<(), PublishError> {
    if is_valid_release_channel(channel) {
        Ok(())
    } else {
        Err(PublishError::InvalidReleaseChannel {
            channel: channel.to_string(),
        })
    }
}
