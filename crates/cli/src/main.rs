//! Warden CLI - start, stop and inspect local AI web UIs
//!
//! Composition root: wires the system adapters into the lifecycle controller.

mod logging;
mod presets;
mod render;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use settings::Settings;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use warden_core::application::LifecycleController;
use warden_core::domain::{ManagedService, ServiceStatus, StartMode};
use warden_core::port::TokioSleeper;
use warden_infra_system::{
    DetachedSpawner, FilePidMarkerStore, ListenerPortProbe, LogTail, NixSignaller,
    SysinfoProcessTable,
};

const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Start, stop and inspect local AI web UIs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Services file (TOML)
    #[arg(long, global = true, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a service unless its port is already taken
    Start {
        /// Service name (e.g., comfy, ostris)
        service: String,

        /// Run in the background and wait for the port (default)
        #[arg(short, long, conflicts_with = "foreground")]
        #[allow(dead_code)]
        detach: bool,

        /// Run attached to this terminal
        #[arg(short, long)]
        foreground: bool,
    },

    /// Stop whatever holds the service's port, supervisors included
    Stop {
        /// Service name
        service: String,
    },

    /// Show who holds the service's port
    Status {
        /// Service name
        service: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the service's log file
    Logs {
        /// Service name
        service: String,

        /// Number of lines to show first
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,

        /// Print and exit instead of following
        #[arg(long)]
        no_follow: bool,
    },

    /// List configured services
    List,
}

fn controller() -> LifecycleController {
    let table = Arc::new(SysinfoProcessTable::new());

    LifecycleController::new(
        Arc::new(ListenerPortProbe::new(table.clone())),
        table,
        Arc::new(DetachedSpawner),
        Arc::new(NixSignaller),
        Arc::new(FilePidMarkerStore),
        Arc::new(TokioSleeper),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "✗ Error:".red().bold(), e);
            ExitCode::from(render::EXIT_FAILED)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Start {
            service,
            foreground,
            ..
        } => {
            let service = settings.service(&service)?;
            let mode = if foreground {
                StartMode::Foreground
            } else {
                StartMode::Detached
            };

            let controller = controller();
            if controller.status(&service)?.status == ServiceStatus::Stopped {
                render::launch_banner(&service, mode);
            }

            let outcome = controller.start(&service, mode).await?;
            Ok(render::start_outcome(&service, &outcome))
        }

        Commands::Stop { service } => {
            let service = settings.service(&service)?;
            let outcome = controller().stop(&service).await?;
            render::stop_outcome(&service, &outcome);
            Ok(render::EXIT_OK)
        }

        Commands::Status { service, json } => {
            let service = settings.service(&service)?;
            let report = controller().status(&service)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                render::status(&report);
            }
            Ok(render::EXIT_OK)
        }

        Commands::Logs {
            service,
            lines,
            no_follow,
        } => {
            let service = settings.service(&service)?;
            show_logs(&service, lines, !no_follow).await
        }

        Commands::List => {
            let mut services = Vec::new();
            for name in settings.names() {
                match settings.service(name) {
                    Ok(service) => services.push(service),
                    Err(e) => eprintln!("{} {}", "⚠".yellow(), e),
                }
            }
            println!("{}", render::service_table(&services));
            Ok(render::EXIT_OK)
        }
    }
}

async fn show_logs(service: &ManagedService, lines: usize, follow: bool) -> Result<u8> {
    let path = &service.log_sink;
    if !path.exists() {
        println!("{}", format!("No log file found at {}", path.display()).red());
        return Ok(render::EXIT_OK);
    }

    let mut tail = LogTail::new(path);
    if follow {
        println!(
            "{}",
            format!("Tailing {} (Ctrl+C to exit)", path.display()).dimmed()
        );
    }

    let last = tail
        .last_lines(lines)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    for line in last {
        println!("{}", line);
    }

    if !follow {
        return Ok(render::EXIT_OK);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = tokio::time::sleep(FOLLOW_POLL_INTERVAL) => {
                match tail.read_new().await {
                    Ok(Some(chunk)) => {
                        print!("{}", chunk);
                        std::io::stdout().flush()?;
                    }
                    Ok(None) => {}
                    // Removed between launches; keep polling
                    Err(e) => tracing::debug!(error = %e, "Log file unavailable"),
                }
            }
        }
    }

    Ok(render::EXIT_OK)
}
