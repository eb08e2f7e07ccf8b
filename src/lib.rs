pub mod core;
pub mod graphql;
pub mod notify;
pub mod orchestration;
pub mod security;
pub mod toolkit;
pub mod ui;
pub mod validation;

pub use crate::core::*;
pub use graphql::{Client, ClientFactory, RenderContext};
pub use notify::{Notifier, UserSettings};
pub use orchestration::{PublishOptions, PublishOrchestrator, PublishResult};
pub use security::SecureTokenManager;
pub use toolkit::ToolkitClient;
pub use ui::{ConsoleReporter, PublishReporter};
