//! Sending the published link to a phone or e-mail address

pub mod notifier;
pub mod user_settings;

pub use notifier::{Notifier, RecipientPrompt, StdinPrompt};
pub use user_settings::UserSettings;
