use auth_identity::{Environment, IdentityConfig, IdentityRepository, InMemoryIdentityRepository, PgIdentityRepository};
use clap::Parser;
use colored::Colorize;
use database_layer::DatabasePool;
use error_common::{log_error, MedGateError, Result};
use logger_redacted::{init_tracing, LogFormat, LoggerConfig};
use medgate_server::{create_app, AppState, CliOverrides, ServerSettings};
use std::sync::Arc;
use tracing::{info, warn};

/// MedGate HTTP Server
#[derive(Parser, Debug)]
#[command(name = "medgate-server")]
#[command(about = "Identity, signup and session API for MedGate")]
struct Args {
    /// Server bind address
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Configuration file path
    #[arg(short, long, default_value = "medgate.toml")]
    config: String,

    /// Deployment environment (development, test, production)
    #[arg(long, env = "MEDGATE_ENV")]
    environment: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let overrides = CliOverrides {
        host: args.host.clone(),
        port: args.port,
        environment: args.environment.clone(),
    };
    let settings = ServerSettings::load(&args.config, &overrides)
        .map_err(|e| MedGateError::ConfigError(e.to_string()))?;
    let environment = settings
        .environment()
        .map_err(|e| MedGateError::ConfigError(e.to_string()))?;

    let logger = LoggerConfig {
        format: if environment.is_development() {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        },
        verbose: args.verbose,
        ..LoggerConfig::default()
    };
    init_tracing(&logger).map_err(|e| MedGateError::ConfigError(e.to_string()))?;

    if environment.is_development() {
        print_startup_banner();
    }

    info!("🏥 {}", "Starting MedGate HTTP Server".bright_cyan());
    info!("📋 Version: {}", env!("CARGO_PKG_VERSION").bright_white());
    info!("🌍 Environment: {}", environment.as_str().bright_white());

    if let Err(e) = run(settings, environment).await {
        log_error("medgate-server", &e);
        return Err(e);
    }
    Ok(())
}

async fn run(settings: ServerSettings, environment: Environment) -> Result<()> {
    let identity_config = IdentityConfig::new(environment, settings.jwt_secret.clone())
        .map_err(|e| MedGateError::ConfigError(e.to_string()))?;

    let (repository, pool) = open_repository(&settings, environment).await?;
    let state = AppState::new(repository, &identity_config, &settings.frontend_origin)?;
    info!("🗄️  Storage backend: {}", state.storage_backend().bright_white());

    let app = create_app(state);

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MedGateError::NetworkError(format!("Failed to bind to {addr}: {e}")))?;

    info!("🚀 {}", format!("MedGate server running on http://{addr}").bright_green());
    info!("📋 {}", format!("Health check available at: http://{addr}/health").bright_blue());
    info!("🔐 {}", format!("Authentication endpoints: http://{addr}/api/auth").bright_blue());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MedGateError::ServerError(format!("HTTP server error: {e}")))?;

    if let Some(pool) = pool {
        pool.close().await;
    }
    info!("MedGate server stopped");
    Ok(())
}

async fn open_repository(
    settings: &ServerSettings,
    environment: Environment,
) -> Result<(Arc<dyn IdentityRepository>, Option<DatabasePool>)> {
    match settings.database_url.as_deref().filter(|url| !url.trim().is_empty()) {
        Some(url) => {
            let pool = DatabasePool::new(url)
                .await
                .map_err(|e| MedGateError::DatabaseError(e.to_string()))?;
            pool.migrate()
                .await
                .map_err(|e| MedGateError::DatabaseError(e.to_string()))?;
            let repository: Arc<dyn IdentityRepository> =
                Arc::new(PgIdentityRepository::new(pool.clone()));
            Ok((repository, Some(pool)))
        }
        None if environment.is_production() => Err(MedGateError::ConfigError(
            "DATABASE_URL must be set in production".to_string(),
        )),
        None => {
            warn!(
                environment = %environment,
                "DATABASE_URL not set, using in-memory storage; registrations are lost on restart"
            );
            let repository: Arc<dyn IdentityRepository> = Arc::new(InMemoryIdentityRepository::new());
            Ok((repository, None))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn print_startup_banner() {
    println!("{}", "╔══════════════════════════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║                         🏥 MEDGATE                           ║".bright_cyan());
    println!("{}", "║               Identity and Session Gateway                   ║".bright_cyan());
    println!("{}", "╚══════════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}
