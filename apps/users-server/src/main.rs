use anyhow::{Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig, BasicAuthenticator};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use users::config::UsersConfig;
use users::Users;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Users Server - minimal user management API with basic auth
#[derive(Parser)]
#[command(name = "users-server")]
#[command(about = "Users Server - minimal user management API with basic auth")]
#[command(version)]
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

    // CLI args passed down to config
    let args = CliArgs {
        port: cli.port,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_layered(cli.config.as_deref())?;

    // Apply CLI overrides (port / verbosity)
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Users Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    let authenticator = BasicAuthenticator::from_config(&config.auth)
        .context("Refusing to start without API credentials")?;

    let ingress_cfg: ApiIngressConfig = config.module_config("api_ingress")?;
    let users_cfg: UsersConfig = config.module_config("users")?;

    tracing::info!("Initializing modules...");
    let users = Users::new(users_cfg);
    let ingress = ApiIngress::new(ingress_cfg, authenticator)
        .with_request_timeout(Duration::from_secs(config.server.timeout_sec));

    let protected = users.register_rest(axum::Router::new());
    let router = ingress.build_router(protected, Some(users.openapi()))?;

    let addr = resolve_bind_addr(&config.server.host, config.server.port).await?;
    ingress
        .serve(addr, router, runtime::shutdown_signal())
        .await?;

    tracing::info!("Users Server stopped");
    Ok(())
}

async fn resolve_bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("Invalid bind address '{host}:{port}'"))?
        .next()
        .with_context(|| format!("No address found for '{host}:{port}'"))
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    config.auth.ensure_configured()?;
    config
        .module_config::<ApiIngressConfig>("api_ingress")
        .context("modules.api_ingress")?;
    config
        .module_config::<UsersConfig>("users")
        .context("modules.users")?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
