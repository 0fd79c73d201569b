use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use modern_services::app::{build_router, AppState};
use modern_services::config::AppConfig;
use modern_services::db::blog_repository::MongoBlogRepository;
use modern_services::db::connection;
use modern_services::db::page_repository::MongoPageRepository;
use modern_services::db::settings_repository::MongoSettingsRepository;
use modern_services::db::testimonial_repository::MongoTestimonialRepository;
use modern_services::email::service::EmailService;
use modern_services::events::TestimonialEvents;
use modern_services::seeder;

#[derive(Parser)]
#[command(name = "modern-services", version, about = "Modern Services website API")]
struct Cli {
    /// TOML configuration file (defaults to ./modern-services.toml if present)
    #[arg(long, global = true, env = "MODERN_SERVICES_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listening port
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Insert default pages and site settings where missing, then exit
    Seed,
    /// Load and validate configuration, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modern_services=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.validate().context("Invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Seed => seed(config).await,
        Command::CheckConfig => {
            tracing::info!(
                "Configuration OK (environment: {}, port: {}, email: {})",
                config.environment,
                config.port,
                if config.email().api_key.is_some() {
                    "configured"
                } else {
                    "disabled"
                }
            );
            Ok(())
        }
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<mongodb::Database> {
    let db = connection::connect(&config.database())
        .await
        .context("Failed to connect to MongoDB")?;
    connection::ensure_indexes(&db)
        .await
        .context("Failed to create MongoDB indexes")?;
    Ok(db)
}

async fn seed(config: AppConfig) -> anyhow::Result<()> {
    let db = connect(&config).await?;
    let report = seeder::seed_defaults(
        &MongoPageRepository::new(&db),
        &MongoSettingsRepository::new(&db),
    )
    .await?;
    tracing::info!(
        "Seed finished: {} pages created, {} already present",
        report.created.len(),
        report.skipped.len()
    );
    Ok(())
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Modern Services API ({})...", config.environment);

    let db = connect(&config).await?;

    let email = Arc::new(
        EmailService::from_config(config.email()).context("Failed to set up email service")?,
    );

    let admin = config.admin();
    if admin.require_for_writes && (admin.email.is_none() || admin.password.is_none()) {
        tracing::warn!(
            "Admin auth is required for writes but no admin credential is configured; \
             dashboard writes will be rejected"
        );
    }

    let events = TestimonialEvents::default();
    let state = AppState {
        blog_repo: Arc::new(MongoBlogRepository::new(&db)),
        page_repo: Arc::new(MongoPageRepository::new(&db)),
        settings_repo: Arc::new(MongoSettingsRepository::new(&db)),
        testimonial_repo: Arc::new(MongoTestimonialRepository::new(&db)),
        email,
        events: events.clone(),
        auth: admin,
    };

    let app = build_router(state, &config.cors());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Open event streams would otherwise keep their connections alive.
            events.close();
        })
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
