//! Lanshare: an ad-hoc HTTPS static file server.
//!
//! This is the application entry point. It loads configuration from an
//! optional TOML file, applies command-line overrides, initializes tracing,
//! prints the startup banner, builds the router, and starts the HTTPS
//! listener. Fatal startup errors (missing certificate, bad PEM data, bind
//! failure) go to stderr and exit non-zero before anything is served.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lanshare::config::{AppConfig, TlsMode, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use lanshare::http::start_server;
use lanshare::routes::create_router;
use lanshare::state::AppState;

/// Lanshare: share a directory over HTTPS on the local network
#[derive(Parser, Debug)]
#[command(name = "lanshare", version, about)]
struct Args {
    /// Path to configuration file (defaults used if the default path is absent)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory to serve (overrides serve.root)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Address to bind (overrides http.host)
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on (overrides http.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Certificate file (overrides tls.cert_path)
    #[arg(long)]
    cert: Option<String>,

    /// Private key file (overrides tls.key_path)
    #[arg(long)]
    key: Option<String>,

    /// Serve plain HTTP instead of HTTPS
    #[arg(long)]
    no_tls: bool,

    /// Log level filter (e.g., "lanshare=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    /// Fold command-line overrides into the loaded configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(root) = &self.root {
            config.serve.root = root.clone();
        }
        if let Some(bind) = &self.bind {
            config.http.host = bind.clone();
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(cert) = &self.cert {
            config.tls.cert_path = cert.clone();
        }
        if let Some(key) = &self.key {
            config.tls.key_path = key.clone();
        }
        if self.no_tls {
            config.tls.mode = TlsMode::None;
        }
    }
}

// All connections multiplex on one runtime thread; a slow client delays the
// rest, which is acceptable for ad-hoc sharing on a trusted network.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("FATAL: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration: an explicit --config must exist, the default path
    // is optional so the binary runs with zero files present
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(DEFAULT_CONFIG_PATH)?,
    };
    args.apply_overrides(&mut config);

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        root = %config.serve.root.display(),
        host = %config.http.host,
        port = config.http.port,
        "Loaded configuration"
    );

    print_banner(&config);

    // Create application state and router
    let state = AppState::new(config.clone());
    let app = create_router(state);

    // Start server; blocks until the process is terminated
    start_server(app, &config).await?;

    Ok(())
}

/// Human-readable startup banner on stdout announcing the serving URL.
fn print_banner(config: &AppConfig) {
    let scheme = match config.tls.mode {
        TlsMode::Manual => "https",
        TlsMode::None => "http",
    };
    let root = std::fs::canonicalize(&config.serve.root)
        .unwrap_or_else(|_| config.serve.root.clone());

    println!("----------------------------------------");
    println!("lanshare {}", env!("CARGO_PKG_VERSION"));
    println!(
        "Serving {} at {}://{}:{}/",
        root.display(),
        scheme,
        config.http.host,
        config.http.port
    );
    if config.http.host == "0.0.0.0" {
        println!("Reachable on any of this machine's network addresses.");
    }
    if config.tls.mode == TlsMode::Manual {
        println!("Accept the self-signed certificate warning on your device.");
    }
    println!("----------------------------------------");
}
