//! ota-publisher CLI
//!
//! Publishes a project's over-the-air update bundle through the development toolkit

use anyhow::Result;
use clap::{Parser, Subcommand};
use ota_publisher::core::config_loader::{ConfigLoadOptions, ConfigLoader};
use ota_publisher::core::config::PublisherConfig;
use ota_publisher::{
    ConsoleReporter, Notifier, PublishError, PublishOptions, PublishOrchestrator,
    SecureTokenManager, SendTo, ToolkitClient, UserSettings,
};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Over-the-air update publishing for toolkit projects
#[derive(Parser, Debug)]
#[command(name = "ota-publisher")]
#[command(version)]
#[command(about = "Over-the-air update publishing for toolkit projects", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Publish your project
    #[command(alias = "p")]
    Publish {
        /// Project directory (defaults to current directory)
        #[arg(value_name = "PROJECT_DIR")]
        project_dir: Option<PathBuf>,

        /// Suppress verbose output from the packager
        #[arg(short, long)]
        quiet: bool,

        /// A phone number or e-mail address to send a link to
        #[arg(
            short,
            long,
            value_name = "DEST",
            num_args = 0..=1,
            default_missing_value = ""
        )]
        send_to: Option<String>,

        /// Clear the packager cache
        #[arg(short, long)]
        clear: bool,

        /// Maximum number of tasks to allow the packager to spawn
        #[arg(long, value_name = "NUM")]
        max_workers: Option<u32>,

        /// The release channel to publish to. Default is 'default'
        #[arg(long, value_name = "NAME")]
        release_channel: Option<String>,
    },
}

/// Initialize the tracing subscriber
///
/// `--debug` forces debug level, otherwise `RUST_LOG` or info.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("ota_publisher=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ota_publisher=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    tracing::debug!("ota-publisher starting with args: {:?}", cli);

    match run(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Publish {
            project_dir,
            quiet,
            send_to,
            clear,
            max_workers,
            release_channel,
        } => {
            let path = project_dir.unwrap_or_else(|| PathBuf::from("."));
            publish_command(
                path,
                quiet,
                SendTo::from_flag(send_to.as_deref()),
                clear,
                max_workers,
                release_channel,
            )
            .await
        }
    }
}

async fn publish_command(
    project_dir: PathBuf,
    quiet: bool,
    send_to: SendTo,
    clear: bool,
    max_workers: Option<u32>,
    release_channel: Option<String>,
) -> Result<i32> {
    let project_dir = std::path::absolute(&project_dir)?;
    let env: HashMap<String, String> = std::env::vars().collect();

    let config = match ConfigLoader::load(ConfigLoadOptions {
        project_path: project_dir.clone(),
        cli_args: PublisherConfig::publish_overrides(release_channel, max_workers),
        env: env.clone(),
    })
    .await
    {
        Ok(config) => config,
        Err(e) => return Ok(report_failure(&e)),
    };

    let options = PublishOptions {
        clear,
        send_to,
        quiet,
        release_channel: config.release_channel().to_string(),
        max_workers: config.max_workers(),
        during_build: false,
    };

    let home = env
        .get("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| project_dir.clone());

    let toolkit = Arc::new(ToolkitClient::new(
        &config.toolkit().api_url,
        SecureTokenManager::from_env(&env),
    ));
    let notifier = Notifier::new(
        Arc::clone(&toolkit),
        UserSettings::in_home(&home),
        config.notifications.as_ref().and_then(|n| n.send_to.clone()),
    );

    let orchestrator = PublishOrchestrator::new(
        toolkit.clone(),
        toolkit,
        Arc::new(notifier),
        Arc::new(ConsoleReporter::new()),
    );

    let shutdown = interrupt_then_force(tokio::signal::ctrl_c, || {
        eprintln!("\nInterrupted again, exiting without cleanup");
        process::exit(130);
    });

    match orchestrator
        .publish_until(&project_dir, &options, shutdown)
        .await
    {
        Ok(result) => {
            tracing::debug!(?result, "publish finished");
            Ok(0)
        }
        Err(e) => Ok(report_failure(&e)),
    }
}

/// Resolves on the first interrupt
///
/// The first interrupt lets the publish flow stop its project server. A second
/// one while that cleanup runs calls `force`.
async fn interrupt_then_force<S, Fut, K>(signal: S, force: K)
where
    S: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = std::io::Result<()>> + Send + 'static,
    K: FnOnce() + Send + 'static,
{
    if signal().await.is_err() {
        // No signal handler available; never interrupt
        std::future::pending::<()>().await;
    }

    tokio::spawn(async move {
        if signal().await.is_ok() {
            force();
        }
    });
}

fn report_failure(error: &PublishError) -> i32 {
    eprintln!("\n❌ {}", error);
    eprintln!("   [{}]", error.code());
    for action in error.suggested_actions() {
        eprintln!("   - {}", action);
    }
    1
}
