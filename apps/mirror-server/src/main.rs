use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use mirror_db::{redact_credentials_in_dsn, ConnectOpts, DbHandle, LimitCfg};
use mirror_kit::HttpLayers;
use rest_api::{PgLedgerRepository, Service, ServiceConfig};
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Mirror Server - read-only REST API over mirrored ledger data
#[derive(Parser)]
#[command(name = "mirror-server")]
#[command(about = "Mirror Server - read-only REST API over mirrored ledger data")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // home_dir is normalized while loading
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Mirror Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

fn connect_opts(cfg: &DatabaseConfig) -> ConnectOpts {
    let defaults = ConnectOpts::default();
    ConnectOpts {
        max_conns: cfg.max_conns.or(defaults.max_conns),
        acquire_timeout: cfg
            .acquire_timeout_ms
            .map(Duration::from_millis)
            .or(defaults.acquire_timeout),
        statement_timeout: cfg.statement_timeout_ms.map(Duration::from_millis),
        ..defaults
    }
}

fn service_config(config: &AppConfig) -> ServiceConfig {
    let api = &config.api;
    ServiceConfig {
        shard: api.shard,
        realm: api.realm,
        limits: LimitCfg {
            default: api.default_limit,
            max: api.max_limit,
        },
        cache_size: api.entity_id_cache.max_size,
        cache_max_age: Duration::from_secs(api.entity_id_cache.max_age_secs),
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!(
        "Connecting to database: {}",
        redact_credentials_in_dsn(Some(&config.database.url))
    );
    let db = DbHandle::connect(&config.database.url, connect_opts(&config.database))
        .await
        .context("Failed to connect to database")?;

    let repo = Arc::new(PgLedgerRepository::new(db.clone()));
    let service = Arc::new(Service::new(repo, service_config(&config))?);

    let layers = HttpLayers {
        timeout: (config.server.timeout_sec > 0)
            .then(|| Duration::from_secs(config.server.timeout_sec)),
        cors: config.server.cors,
        ..HttpLayers::default()
    };
    let app = rest_api::build_router(service, &layers);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = runtime::wait_for_shutdown().await {
                tracing::error!(error = %e, "shutdown signal handler failed");
            }
        })
        .await
        .context("HTTP server failed")?;

    db.close().await;
    tracing::info!("Mirror Server stopped");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Loading already validated the api section; the DSN scheme is checked here
    DbHandle::detect(&config.database.url)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
