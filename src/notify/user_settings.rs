//! Persistent user settings
//!
//! Stored as JSON in `~/.ota-publisher/settings.json`. Only the remembered
//! `--send-to` recipient lives here for now.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const SETTINGS_DIR: &str = ".ota-publisher";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsData {
    #[serde(skip_serializing_if = "Option::is_none")]
    send_to: Option<String>,
}

/// User settings file handle
#[derive(Debug, Clone)]
pub struct UserSettings {
    path: PathBuf,
}

impl UserSettings {
    /// Settings under the given home directory
    pub fn in_home<P: AsRef<Path>>(home: P) -> Self {
        Self {
            path: home.as_ref().join(SETTINGS_DIR).join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> anyhow::Result<SettingsData> {
        if !self.path.exists() {
            return Ok(SettingsData::default());
        }
        let content = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn write(&self, data: &SettingsData) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a temp file then rename so a crash never leaves half a file
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(data)?).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    /// Remembered recipient, if any
    pub async fn send_to(&self) -> anyhow::Result<Option<String>> {
        Ok(self.read().await?.send_to)
    }

    /// Remember `recipient` for the next bare `--send-to`
    pub async fn set_send_to(&self, recipient: &str) -> anyhow::Result<()> {
        let mut data = self.read().await?;
        data.send_to = Some(recipient.to_string());
        self.write(&data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_has_no_recipient() {
        let home = TempDir::new().unwrap();
        let settings = UserSettings::in_home(home.path());

        assert_eq!(settings.send_to().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_send_to_round_trips() {
        let home = TempDir::new().unwrap();
        let settings = UserSettings::in_home(home.path());

        settings.set_send_to("dev@example.com").await.unwrap();

        assert!(settings.path().exists());
        assert_eq!(
            settings.send_to().await.unwrap().as_deref(),
            Some("dev@example.com")
        );
    }

    #[tokio::test]
    async fn test_corrupted_file_is_an_error() {
        let home = TempDir::new().unwrap();
        let settings = UserSettings::in_home(home.path());
        std::fs::create_dir_all(settings.path().parent().unwrap()).unwrap();
        std::fs::write(settings.path(), "{not json").unwrap();

        assert!(settings.send_to().await.is_err());
    }
}
