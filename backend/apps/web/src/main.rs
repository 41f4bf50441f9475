//! Web Server Entry Point
//!
//! Uses `anyhow` for startup errors; request-level errors go through
//! `kernel::error::AppError`.

use std::net::SocketAddr;
use std::sync::Arc;

use identity::{FacebookOptions, FacebookProvider, IdentityState, PgIdentityRepository};
use mailer::SmtpEmailSender;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use web::{AppSettings, build_app, endpoints};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "web=info,home=info,identity=info,mailer=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = AppSettings::from_env()?;
    tracing::info!(environment = %settings.environment, "Settings loaded");

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: expired sessions and spent tokens
    // Errors here should not prevent server startup
    let repo = PgIdentityRepository::new(pool);
    match repo.cleanup_expired().await {
        Ok(deleted) => {
            tracing::info!(records_deleted = deleted, "Identity cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Identity cleanup failed, continuing anyway");
        }
    }

    // One sender for the whole process
    let mailer = Arc::new(SmtpEmailSender::new(settings.email_sender.clone()));

    let facebook = match &settings.facebook {
        Some(fb) => Some(FacebookProvider::new(FacebookOptions::new(
            fb.app_id.clone(),
            fb.app_secret.clone(),
        ))?),
        None => {
            tracing::warn!("Facebook login is not configured; external login endpoints are disabled");
            None
        }
    };

    let identity = IdentityState::new(repo, mailer, settings.identity_config(), facebook);

    if settings.https_port.is_none() {
        tracing::warn!("Failed to determine the https port for redirect.");
    }

    let app = build_app(&settings.pipeline(), endpoints(identity));

    // Start server
    tracing::info!("Listening on {}", settings.server_address);

    let listener = TcpListener::bind(settings.server_address).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
