//! storyforge - service entry point

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use storyforge::api::listener::{cleanup_socket, create_listener_at, read_request, send_response};
use storyforge::api::{ApiRequest, ApiResponse, Service, ServiceClient};
use storyforge::cli::{Cli, Command, get_log_path};
use storyforge::config::Config;
use storyforge::llm::{LlmClient, create_client};
use storyforge::state::StateManager;

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let level = match cli_log_level.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Serve => cmd_serve(&config).await,
        Command::Ping => cmd_ping(&config).await,
    }
}

/// Ping a running service over its socket
async fn cmd_ping(config: &Config) -> Result<()> {
    debug!("cmd_ping: called");
    let client = ServiceClient::new(&config.api.socket_path);

    if !client.socket_exists() {
        println!("Service is not running (no socket at {})", config.api.socket_path.display());
        return Ok(());
    }

    match client.ping().await {
        Ok(version) => {
            println!("Service is alive and responsive");
            println!("Version: {}", version);
        }
        Err(e) => {
            println!("Socket exists but the service is not responding");
            println!("Error: {}", e);
        }
    }

    Ok(())
}

/// Run the service until a signal or a Shutdown request arrives
async fn cmd_serve(config: &Config) -> Result<()> {
    debug!("cmd_serve: called");
    info!("Service starting...");

    // Early validation: warn when no API key is available. CRUD still
    // works without one; AI operations will report a generation failure.
    let llm: Option<Arc<dyn LlmClient>> = match config.validate() {
        Ok(()) => match create_client(&config.llm) {
            Ok(client) => {
                info!(model = %config.llm.model, "LLM client initialized");
                Some(client)
            }
            Err(e) => {
                warn!(error = %e, "Failed to create LLM client; AI operations disabled");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "LLM not configured; AI operations disabled");
            None
        }
    };

    let db_path = PathBuf::from(&config.storage.db_path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create storage directory")?;
    }

    let state = StateManager::spawn(&db_path).map_err(|e| eyre::eyre!("Failed to open store: {}", e))?;
    info!(db_path = %db_path.display(), "StateManager initialized");

    let service = Service::new(state.clone(), llm);

    let (listener, socket_path) = create_listener_at(&config.api.socket_path)?;
    info!(?socket_path, "Socket listening");

    info!("Service running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    warn!("SIGINT received");
                    break;
                }
                _ = sigterm.recv() => {
                    warn!("SIGTERM received");
                    break;
                }
                accepted = listener.accept() => {
                    let (mut stream, _) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    match read_request(&mut stream).await {
                        Ok(ApiRequest::Shutdown) => {
                            info!("Shutdown requested over socket");
                            let _ = send_response(&mut stream, &ApiResponse::ShuttingDown).await;
                            break;
                        }
                        Ok(request) => {
                            let service = service.clone();
                            tokio::spawn(async move {
                                let response = service.handle(request).await;
                                if let Err(e) = send_response(&mut stream, &response).await {
                                    warn!(error = %e, "Failed to send response");
                                }
                            });
                        }
                        Err(e) => {
                            debug!(error = %e, "Malformed request");
                            let response = ApiResponse::Invalid {
                                violations: vec![storyforge::validation::FieldViolation::new(
                                    "request",
                                    e.to_string(),
                                )],
                            };
                            let _ = send_response(&mut stream, &response).await;
                        }
                    }
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    info!("Service shutting down...");
    cleanup_socket(&socket_path);
    state.shutdown().await;
    debug!("cmd_serve: shutdown complete");
    Ok(())
}
