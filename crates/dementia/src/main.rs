// crates/dementia/src/main.rs
// Dementia - versioned, project-scoped context memory for MCP agents

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dementia::wiring::Application;
use dementia_infrastructure::config::{AppConfig, Transport};
use dementia_infrastructure::{logging, storage};
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "dementia", about = "Versioned, project-scoped context memory over MCP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server (default when no subcommand is given).
    Serve {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum)]
        transport: Option<CliTransport>,
        #[arg(long)]
        json_logs: bool,
    },
    /// Apply the control-namespace schema and exit.
    Migrate {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Load and validate configuration without connecting to anything.
    CheckConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliTransport {
    Stdio,
    Http,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve { config: None, transport: None, json_logs: false }) {
        Commands::Serve { config, transport, json_logs } => {
            logging::init(json_logs);
            let mut config = AppConfig::load(config.as_deref()).context("failed to load configuration")?;
            if let Some(transport) = transport {
                config.server.transport = match transport {
                    CliTransport::Stdio => Transport::Stdio,
                    CliTransport::Http => Transport::Http,
                };
            }
            run_serve(config).await
        }
        Commands::Migrate { config } => {
            logging::init(false);
            let config = AppConfig::load(config.as_deref()).context("failed to load configuration")?;
            run_migrate(config).await
        }
        Commands::CheckConfig { config } => {
            let config = AppConfig::load(config.as_deref()).context("failed to load configuration")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run_migrate(config: AppConfig) -> Result<()> {
    let app = Application::wire(config).await?;
    storage::ensure_control_namespace(app.storage.pool()).await?;
    tracing::info!("control namespace migration complete");
    Ok(())
}

async fn run_serve(config: AppConfig) -> Result<()> {
    let app = Application::wire(config).await?;
    storage::ensure_control_namespace(app.storage.pool()).await?;
    app.spawn_cleanup_task();

    match app.config.server.transport {
        Transport::Stdio => serve_stdio(&app).await,
        Transport::Http => serve_http(&app).await,
    }
}

async fn serve_stdio(app: &Application) -> Result<()> {
    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(app.server(), transport)
        .await
        .context("failed to start stdio MCP transport")?;
    service.waiting().await.context("MCP server loop failed")?;
    Ok(())
}

async fn serve_http(app: &Application) -> Result<()> {
    let sessions = app.sessions.clone();
    let projects = app.projects.clone();
    let memory = app.memory.clone();
    let project_cache = app.project_cache.clone();

    let service_factory = move || {
        Ok(dementia_server::DementiaServer::new(
            sessions.clone(),
            projects.clone(),
            memory.clone(),
            project_cache.clone(),
        ))
    };

    let session_manager = std::sync::Arc::new(LocalSessionManager::default());
    let mcp_service = StreamableHttpService::new(
        service_factory,
        session_manager,
        StreamableHttpServerConfig {
            sse_keep_alive: Some(std::time::Duration::from_secs(15)),
            sse_retry: Some(std::time::Duration::from_secs(3)),
            stateful_mode: true,
            cancellation_token: CancellationToken::new(),
        },
    );

    let router = axum::Router::new().nest_service("/mcp", mcp_service);
    let listener = tokio::net::TcpListener::bind(&app.config.server.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", app.config.server.http_addr))?;
    tracing::info!(addr = %app.config.server.http_addr, "listening for streamable HTTP MCP connections");
    axum::serve(listener, router).await.context("HTTP server loop failed")?;
    Ok(())
}
