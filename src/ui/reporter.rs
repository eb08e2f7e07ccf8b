//! Publish progress reporting
//!
//! The orchestrator never prints directly; it talks to a [`PublishReporter`].
//! [`ConsoleReporter`] renders to the terminal, with an `indicatif` spinner
//! standing in for packager output in quiet mode.
//!
//! User-facing messages are written straight to stderr so that log filtering
//! never hides them. Stdout carries only the published URL.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;
use std::time::Duration;

/// Sink for everything the publish flow wants the user to see
pub trait PublishReporter: Send + Sync {
    /// Progress message
    fn info(&self, message: &str);

    /// Non-fatal problem
    fn warn(&self, message: &str);

    /// The published URL
    fn published(&self, url: &str);

    /// Quiet-mode progress indicator started
    fn progress_started(&self);

    /// Quiet-mode progress indicator stopped
    fn progress_finished(&self);
}

/// Terminal reporter
pub struct ConsoleReporter {
    spinner: Mutex<Option<ProgressBar>>,
    messages: Mutex<Box<dyn Write + Send>>,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stderr()))
    }

    /// Reporter writing progress messages to `messages`
    pub fn with_writer(messages: Box<dyn Write + Send>) -> Self {
        Self {
            spinner: Mutex::new(None),
            messages: Mutex::new(messages),
        }
    }

    fn write_line(&self, line: &str) {
        let Ok(mut out) = self.messages.lock() else {
            return;
        };
        let mut write = || {
            // Write errors are ignored
            let _ = writeln!(out, "{}", line);
        };

        let spinner = self.spinner.lock().ok().and_then(|guard| guard.clone());
        match spinner {
            Some(bar) => bar.suspend(write),
            None => write(),
        }
    }

    fn new_spinner() -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.magenta} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message("Publishing...");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }
}

impl PublishReporter for ConsoleReporter {
    fn info(&self, message: &str) {
        self.write_line(message);
    }

    fn warn(&self, message: &str) {
        self.write_line(&format!("{} {}", style("Warning:").yellow().bold(), message));
    }

    fn published(&self, url: &str) {
        self.write_line("Published");
        if std::io::stdout().is_terminal() {
            println!("Your URL is\n\n{}\n", style(url).underlined());
        } else {
            // Raw URL for scripts piping our stdout
            println!("{}", url);
        }
    }

    fn progress_started(&self) {
        let Ok(mut spinner) = self.spinner.lock() else {
            return;
        };
        if spinner.is_none() {
            *spinner = Some(Self::new_spinner());
        }
    }

    fn progress_finished(&self) {
        let Ok(mut spinner) = self.spinner.lock() else {
            return;
        };
        if let Some(bar) = spinner.take() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_messages_are_written_without_a_log_subscriber() {
        let buffer = SharedBuffer::default();
        let reporter = ConsoleReporter::with_writer(Box::new(buffer.clone()));

        reporter.info("Publishing to channel 'default'...");
        reporter.warn("Failed to send link");

        let output = buffer.contents();
        assert!(output.contains("Publishing to channel 'default'...\n"));
        assert!(output.contains("Failed to send link"));
        assert!(output.contains("Warning:"));
    }

    #[test]
    fn test_messages_written_while_spinner_runs() {
        let buffer = SharedBuffer::default();
        let reporter = ConsoleReporter::with_writer(Box::new(buffer.clone()));

        reporter.progress_started();
        reporter.info("still here");
        reporter.progress_finished();

        assert_eq!(buffer.contents(), "still here\n");
    }

    #[test]
    fn test_progress_start_and_finish() {
        let reporter = ConsoleReporter::new();

        reporter.progress_started();
        assert!(reporter.spinner.lock().unwrap().is_some());

        reporter.progress_finished();
        assert!(reporter.spinner.lock().unwrap().is_none());
    }

    #[test]
    fn test_progress_finish_without_start_is_noop() {
        let reporter = ConsoleReporter::new();
        reporter.progress_finished();
        assert!(reporter.spinner.lock().unwrap().is_none());
    }

    #[test]
    fn test_progress_started_twice_keeps_one_spinner() {
        let reporter = ConsoleReporter::new();
        reporter.progress_started();
        reporter.progress_started();
        reporter.progress_finished();
        assert!(reporter.spinner.lock().unwrap().is_none());
    }
}
