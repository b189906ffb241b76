//! vind - VIN decoder gateway daemon
//!
//! Serves the browser frontend and relays VIN decode and vehicle lookup
//! requests to the NHTSA vPIC API.
//!
//! Usage:
//!   vind [OPTIONS] [config.toml]
//!
//! Options:
//!   -p, --port <port>         Listen port (overrides config and PORT)
//!   --static-dir <path>       Frontend document root
//!
//! Without a config file the built-in defaults apply, adjusted by the
//! PORT, RATE_LIMIT, RATE_LIMIT_WINDOW_SECS, VPIC_BASE_URL and STATIC_DIR
//! environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vin_api::{create_router, AppState, GatewayConfig};

/// Parsed command-line arguments
#[derive(Debug, Default)]
struct Args {
    /// Gateway config file (TOML)
    config_path: Option<String>,
    /// `--port` value, validated after parsing
    port: Option<String>,
    static_dir: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                if let Some(value) = args.get(i + 1) {
                    result.port = Some(value.clone());
                    i += 2;
                } else {
                    tracing::error!("Missing argument for --port");
                    i += 1;
                }
            }
            "--static-dir" => {
                if let Some(value) = args.get(i + 1) {
                    result.static_dir = Some(PathBuf::from(value));
                    i += 2;
                } else {
                    tracing::error!("Missing argument for --static-dir");
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                result.config_path = Some(arg.to_string());
                i += 1;
            }
            _ => {
                tracing::warn!("Unknown argument: {}", args[i]);
                i += 1;
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"vind - VIN decoder gateway daemon

Usage: vind [OPTIONS] [config.toml]

Options:
  -p, --port <port>       Listen port (default 3000)
      --static-dir <path> Frontend document root (default ./public)
  -h, --help              Print this help message

Environment:
  PORT                    Listen port
  RATE_LIMIT              Requests per client per window on /api/* (default 100)
  RATE_LIMIT_WINDOW_SECS  Window length in seconds (default 900)
  VPIC_BASE_URL           Upstream base URL
  STATIC_DIR              Frontend document root
  RUST_LOG                Log filter

Examples:
  # Run with defaults
  vind

  # Run with config file on another port
  vind --port 8080 config/vind.toml
"#
    );
}

/// Build the effective configuration: file, then environment, then flags
fn load_config(args: &Args) -> anyhow::Result<GatewayConfig> {
    let mut config = match args.config_path {
        Some(ref path) => {
            tracing::info!("Loading config from: {}", path);
            GatewayConfig::load(path)?
        }
        None => GatewayConfig::default(),
    };

    config.apply_env()?;

    if let Some(ref port) = args.port {
        config.server.port = port
            .parse()
            .with_context(|| format!("Invalid --port value '{}'", port))?;
    }
    if let Some(ref dir) = args.static_dir {
        config.server.static_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vind=info,vin_api=info,vpic_client=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting vind (VIN decoder gateway)");

    let args = parse_args();
    let config = load_config(&args)?;

    let state = AppState::from_config(&config).context("Failed to create vPIC client")?;
    tracing::info!(
        upstream = %state.client().base_url(),
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        static_dir = %config.server.static_dir.display(),
        "Gateway configured"
    );

    // Drop windows of clients that went quiet
    let limiter = state.limiter_arc();
    let prune_every = Duration::from_secs(config.rate_limit.window_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(prune_every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let pruned = limiter.prune_expired();
            if pruned > 0 {
                tracing::debug!(pruned, "Pruned expired rate limit windows");
            }
        }
    });

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.server.port);
    tracing::info!("API base: http://localhost:{}/api", config.server.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("vind stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received terminate signal, shutting down"),
    }
}
