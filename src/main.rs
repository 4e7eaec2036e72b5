use anyhow::Result;
use clap::{Parser, Subcommand};
use s3_console::{
    client::ConsoleClient,
    commands::ClientCommands,
    config::{self, AppConfig, BackendKind, ServeArgs},
    routes::routes::app,
    services::{
        backend::Connector,
        console_service::ConsoleService,
        memory_backend::{MemoryBackend, MemoryConnector},
        s3_backend::S3Connector,
    },
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "s3-console")]
#[command(about = "Admin console for S3-compatible object storage", long_about = None)]
struct Cli {
    /// API base URL for client commands (overrides S3_CONSOLE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the REST API (default)
    Serve(ServeArgs),
    #[command(flatten)]
    Client(ClientCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        None => serve(ServeArgs::default()).await,
        Some(Command::Serve(args)) => serve(args).await,
        Some(Command::Client(command)) => {
            let client = ConsoleClient::new(&config::api_url(cli.api_url))?;
            command.handle(&client).await
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let cfg = AppConfig::from_env_and_args(args)?;
    tracing::info!("Starting s3-console with config: {:?}", cfg);

    // --- Initialize core service ---
    let connector: Arc<dyn Connector> = match cfg.backend {
        BackendKind::S3 => Arc::new(S3Connector),
        BackendKind::Memory => {
            tracing::warn!("Using the in-memory backend; objects are lost on exit");
            Arc::new(MemoryConnector::new(MemoryBackend::new()))
        }
    };
    let service = ConsoleService::new(connector);

    if let Some(dir) = &cfg.static_dir {
        if !dir.join("index.html").exists() {
            tracing::warn!("No index.html in {}; only the API will be served", dir.display());
        }
    }

    // --- Build router ---
    let router = app(service, cfg.max_upload_bytes, cfg.static_dir.as_deref());

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}
