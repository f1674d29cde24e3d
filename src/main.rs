use anyhow::{Context, Result};
use clap::Parser;
use poslauncher::{
    cli::{Cli, Commands, ConfigAction, ConsoleObserver, StartupAction},
    config::ConfigStore,
    launcher::ClientLauncher,
    orchestrator::LaunchOrchestrator,
    platform::{platform_name, Capabilities},
    service::ServiceStatus,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct StatusReport {
    platform: &'static str,
    startup_registered: bool,
    primary: ServiceStatus,
    secondary: ServiceStatus,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => ConfigStore::default_path()?,
    };
    let store = Arc::new(ConfigStore::open(config_path));
    let capabilities = Capabilities::platform_default();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = store.get();
            let orchestrator = LaunchOrchestrator::new(store.clone(), capabilities);
            orchestrator.subscribe(Arc::new(ConsoleObserver::stdout(
                config.show_status_updates,
            )));

            if orchestrator.run().await.is_err() {
                std::process::exit(1);
            }
        }
        Commands::Status { json } => {
            let report = StatusReport {
                platform: platform_name(),
                startup_registered: capabilities.registrar.is_registered().await,
                primary: capabilities.probe.check_primary().await,
                secondary: capabilities.probe.check_fixed().await,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Platform:             {}", report.platform);
                println!(
                    "Startup registration: {}",
                    if report.startup_registered { "yes" } else { "no" }
                );
                print_service(&report.primary);
                print_service(&report.secondary);
            }
        }
        Commands::Startup { action } => {
            let registrar = capabilities.registrar;
            let ok = match action {
                StartupAction::Register => registrar.register().await,
                StartupAction::Unregister => registrar.unregister().await,
                StartupAction::Status => {
                    let registered = registrar.is_registered().await;
                    println!("{}", if registered { "registered" } else { "not registered" });
                    true
                }
            };
            if !ok {
                error!("Startup registration change failed");
                std::process::exit(1);
            }
        }
        Commands::Discover => {
            let client = ClientLauncher::new(
                store.clone(),
                capabilities.locator,
                capabilities.launcher,
            );
            if !client.discover().await {
                error!("Client executable not found in any known location");
                std::process::exit(1);
            }
            let config = store.get();
            info!("Saved client location to {}", store.path().display());
            println!("{}", config.client_executable_path);
            if !config.client_arguments.is_empty() {
                println!("arguments: {}", config.client_arguments);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = store.get();
                print!(
                    "{}",
                    toml::to_string_pretty(&config).context("Failed to render configuration")?
                );
            }
            ConfigAction::Path => {
                println!("{}", store.path().display());
            }
            ConfigAction::Set { key, value } => {
                let mut config = store.get();
                config.set_field(&key, &value)?;
                store.save(config)?;
                info!("Set {} = {}", key, value);
            }
        },
        Commands::Version => {
            println!("poslauncher {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn print_service(status: &ServiceStatus) {
    let detail = match &status.error_message {
        Some(message) if !message.is_empty() => format!("{} ({})", status.state, message),
        _ => format!("{} [{}]", status.state, status.service_key),
    };
    println!("{:<22}{}", format!("{}:", status.display_name), detail);
}
