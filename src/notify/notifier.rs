//! Notifier - resolves who gets the published link and sends it
//!
//! Resolution order for a bare `--send-to`:
//! 1. `notifications.sendTo` from configuration
//! 2. The recipient remembered in user settings
//! 3. An interactive prompt
//!
//! Whatever gets resolved is remembered for next time.

use crate::core::traits::{NotificationSender, Recipient, SendTo};
use crate::notify::user_settings::UserSettings;
use crate::toolkit::client::ToolkitClient;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Asks the user for a recipient
#[async_trait]
pub trait RecipientPrompt: Send + Sync {
    /// Returns `None` when the user enters nothing
    async fn ask(&self) -> anyhow::Result<Option<String>>;
}

/// Prompt on stdin/stdout
pub struct StdinPrompt;

#[async_trait]
impl RecipientPrompt for StdinPrompt {
    async fn ask(&self) -> anyhow::Result<Option<String>> {
        let mut stdout = io::stdout();
        stdout
            .write_all(b"Enter an e-mail address or phone number to send the link to: ")
            .await?;
        stdout.flush().await?;

        let mut reader = BufReader::new(io::stdin());
        let mut answer = String::new();
        reader.read_line(&mut answer).await?;

        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }
}

/// [`NotificationSender`] backed by user settings and the toolkit API
pub struct Notifier {
    sender: Arc<ToolkitClient>,
    settings: UserSettings,
    configured: Option<String>,
    prompt: Box<dyn RecipientPrompt>,
}

impl Notifier {
    /// Create a new Notifier
    ///
    /// # Arguments
    ///
    /// * `sender` - Toolkit client that performs the delivery
    /// * `settings` - Where the last recipient is remembered
    /// * `configured` - Recipient from configuration, preferred over settings
    pub fn new(
        sender: Arc<ToolkitClient>,
        settings: UserSettings,
        configured: Option<String>,
    ) -> Self {
        Self {
            sender,
            settings,
            configured,
            prompt: Box::new(StdinPrompt),
        }
    }

    /// Replace the interactive prompt
    pub fn with_prompt(mut self, prompt: Box<dyn RecipientPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    async fn saved_or_prompted(&self) -> anyhow::Result<Option<String>> {
        if let Some(configured) = &self.configured {
            return Ok(Some(configured.clone()));
        }

        if let Some(saved) = self.settings.send_to().await? {
            tracing::debug!("using recipient saved in {}", self.settings.path().display());
            return Ok(Some(saved));
        }

        self.prompt.ask().await
    }
}

#[async_trait]
impl NotificationSender for Notifier {
    async fn recipient(&self, hint: &SendTo) -> anyhow::Result<Option<Recipient>> {
        let resolved = match hint {
            SendTo::None => return Ok(None),
            SendTo::Explicit(dest) => Some(dest.clone()),
            SendTo::Saved => self.saved_or_prompted().await?,
        };

        let Some(recipient) = resolved else {
            tracing::info!("No recipient given, the link will not be sent");
            return Ok(None);
        };

        if let Err(e) = self.settings.set_send_to(&recipient).await {
            tracing::warn!(error = %e, "could not remember recipient");
        }

        Ok(Some(Recipient(recipient)))
    }

    async fn send_url(&self, url: &str, recipient: &Recipient) -> anyhow::Result<()> {
        self.sender.send_link(url, recipient).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::token_manager::SecureTokenManager;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FixedPrompt {
        answer: Option<String>,
        asked: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RecipientPrompt for FixedPrompt {
        async fn ask(&self) -> anyhow::Result<Option<String>> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    fn notifier(
        home: &TempDir,
        configured: Option<&str>,
        answer: Option<&str>,
    ) -> (Notifier, Arc<AtomicUsize>) {
        let asked = Arc::new(AtomicUsize::new(0));
        let client = Arc::new(ToolkitClient::new(
            "http://127.0.0.1:9/api",
            SecureTokenManager::default(),
        ));
        let notifier = Notifier::new(
            client,
            UserSettings::in_home(home.path()),
            configured.map(str::to_string),
        )
        .with_prompt(Box::new(FixedPrompt {
            answer: answer.map(str::to_string),
            asked: Arc::clone(&asked),
        }));
        (notifier, asked)
    }

    #[tokio::test]
    async fn test_no_flag_means_no_recipient() {
        let home = TempDir::new().unwrap();
        let (notifier, asked) = notifier(&home, Some("cfg@example.com"), None);

        assert_eq!(notifier.recipient(&SendTo::None).await.unwrap(), None);
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_explicit_recipient_is_remembered() {
        let home = TempDir::new().unwrap();
        let (notifier, _) = notifier(&home, None, None);

        let recipient = notifier
            .recipient(&SendTo::Explicit("+15555550100".to_string()))
            .await
            .unwrap();

        assert_eq!(recipient, Some(Recipient("+15555550100".to_string())));
        let saved = UserSettings::in_home(home.path()).send_to().await.unwrap();
        assert_eq!(saved.as_deref(), Some("+15555550100"));
    }

    #[tokio::test]
    async fn test_saved_prefers_configuration() {
        let home = TempDir::new().unwrap();
        UserSettings::in_home(home.path())
            .set_send_to("old@example.com")
            .await
            .unwrap();
        let (notifier, asked) = notifier(&home, Some("cfg@example.com"), None);

        let recipient = notifier.recipient(&SendTo::Saved).await.unwrap();

        assert_eq!(recipient, Some(Recipient("cfg@example.com".to_string())));
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_saved_uses_user_settings() {
        let home = TempDir::new().unwrap();
        UserSettings::in_home(home.path())
            .set_send_to("old@example.com")
            .await
            .unwrap();
        let (notifier, asked) = notifier(&home, None, Some("new@example.com"));

        let recipient = notifier.recipient(&SendTo::Saved).await.unwrap();

        assert_eq!(recipient, Some(Recipient("old@example.com".to_string())));
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_saved_prompts_when_nothing_remembered() {
        let home = TempDir::new().unwrap();
        let (notifier, asked) = notifier(&home, None, Some("new@example.com"));

        let recipient = notifier.recipient(&SendTo::Saved).await.unwrap();

        assert_eq!(recipient, Some(Recipient("new@example.com".to_string())));
        assert_eq!(asked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_prompt_answer_skips_sending() {
        let home = TempDir::new().unwrap();
        let (notifier, _) = notifier(&home, None, None);

        assert_eq!(notifier.recipient(&SendTo::Saved).await.unwrap(), None);
        assert_eq!(UserSettings::in_home(home.path()).send_to().await.unwrap(), None);
    }
}
