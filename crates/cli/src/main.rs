mod config;
mod error;

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use error::{Error, Result};
use futures::StreamExt;
use holomush_broadcaster::Broadcaster;
use holomush_common::RequestContext;
use holomush_sessions::SessionManager;
use holomush_store::{CredentialVerifier, EventStore, InMemoryEventStore, StaticCredentialVerifier, UnconfiguredVerifier};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "holomush", about = "Holomush shared-world server core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the RPC server core.
    Serve {
        /// Path to a deployment config TOML file.
        #[arg(long)]
        config: PathBuf,

        /// Run in plaintext with no authentication configured, ignoring
        /// `tls`/`credentials_file` in the config file. For local
        /// development only.
        #[arg(long, default_value_t = false)]
        insecure: bool,
    },
    /// Generate a new CA for a deployment.
    GenCa {
        #[arg(long)]
        game_id: String,
        #[arg(long)]
        dir: PathBuf,
    },
    /// Issue a leaf certificate signed by a deployment's CA.
    GenCert {
        #[arg(long, value_enum)]
        kind: CertKind,
        #[arg(long)]
        name: String,
        #[arg(long)]
        dir: PathBuf,
        /// Required for `--kind server`; stamped into the SANs.
        #[arg(long)]
        game_id: Option<String>,
    },
    /// Connect to a running server and issue one command interactively.
    Client {
        #[arg(long)]
        addr: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Command to run, e.g. "say hello". Omit to only authenticate.
        #[arg(long)]
        command: Option<String>,
        /// Stream to subscribe to after the command runs, e.g. "location:1".
        #[arg(long)]
        subscribe: Option<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CertKind {
    Server,
    Client,
}

fn init_telemetry(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry.with(fmt::layer().json().with_target(true).with_thread_ids(false)).init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false).with_ansi(true))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);
    info!(version = env!("CARGO_PKG_VERSION"), "holomush starting");

    match cli.command {
        Commands::Serve { config, insecure } => run_serve(&config, insecure).await,
        Commands::GenCa { game_id, dir } => run_gen_ca(&game_id, &dir),
        Commands::GenCert { kind, name, dir, game_id } => run_gen_cert(kind, &name, &dir, game_id.as_deref()),
        Commands::Client {
            addr,
            username,
            password,
            command,
            subscribe,
        } => run_client(&addr, &username, &password, command.as_deref(), subscribe.as_deref()).await,
    }
}

async fn run_serve(config_path: &std::path::Path, insecure: bool) -> Result<()> {
    let config = config::Config::load(config_path)?;

    let event_store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
    let credential_verifier: Arc<dyn CredentialVerifier> = match &config.credentials_file {
        Some(path) if !insecure => Arc::new(StaticCredentialVerifier::load(path)?),
        _ => Arc::new(UnconfiguredVerifier),
    };

    let handler = holomush_server::RpcHandler::new(event_store, credential_verifier, Broadcaster::new(), SessionManager::new());

    let tls_config = if config.tls && !insecure {
        Some(Arc::new(holomush_identity::load_server_tls(&config.identity_dir, &config.server_name)?))
    } else {
        None
    };

    let listener = TcpListener::bind(&config.bind).await?;
    let shutdown = RequestContext::new();
    let ctrl_c_signal = shutdown.clone();

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        ctrl_c_signal.cancel();
    });

    holomush_server::serve(listener, tls_config, handler, shutdown).await?;
    Ok(())
}

fn run_gen_ca(game_id: &str, dir: &std::path::Path) -> Result<()> {
    let ca = holomush_identity::generate_ca(game_id)?;
    holomush_identity::save(dir, &ca, None)?;
    info!(%game_id, dir = %dir.display(), "generated CA");
    Ok(())
}

fn run_gen_cert(kind: CertKind, name: &str, dir: &std::path::Path, game_id: Option<&str>) -> Result<()> {
    let ca = holomush_identity::load_ca(dir)?;
    match kind {
        CertKind::Server => {
            let game_id = game_id.ok_or_else(|| Error::message("--game-id is required for a server certificate"))?;
            let cert = holomush_identity::generate_server_cert(&ca, game_id, name)?;
            holomush_identity::save(dir, &ca, Some((name, &cert)))?;
        }
        CertKind::Client => {
            let cert = holomush_identity::generate_client_cert(&ca, name)?;
            holomush_identity::save_client(dir, name, &cert)?;
        }
    }
    info!(%name, dir = %dir.display(), "issued certificate");
    Ok(())
}

async fn run_client(addr: &str, username: &str, password: &str, command: Option<&str>, subscribe: Option<&str>) -> Result<()> {
    let mut client = holomush_client::RpcClient::connect(addr).await?;
    let auth = client.authenticate(username, password).await?;
    if !auth.success {
        return Err(Error::message(auth.error.unwrap_or_else(|| "authentication failed".into())));
    }
    let session_id = auth.session_id.expect("successful authentication carries a session id");
    info!(character = ?auth.character_name, %session_id, "authenticated");

    if let Some(command) = command {
        let response = client.handle_command(session_id.as_str(), command).await?;
        info!(success = response.success, output = ?response.output, error = ?response.error, "command result");
    }

    if let Some(stream) = subscribe {
        let mut events = Box::pin(client.subscribe(session_id, vec![stream.to_string()]));
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => info!(stream = %event.stream, r#type = ?event.r#type, "event"),
                Err(err) => {
                    info!(%err, "subscription ended");
                    break;
                }
            }
        }
    }

    Ok(())
}
