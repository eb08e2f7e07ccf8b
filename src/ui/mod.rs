//! User-facing output for the publish flow

pub mod reporter;

pub use reporter::{ConsoleReporter, PublishReporter};
