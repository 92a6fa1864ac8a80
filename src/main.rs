use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

use pulsewise_backend::config::settings::{get_config, get_jwt_settings};
use pulsewise_backend::run;
use pulsewise_backend::services::import_service::ImportTarget;
use pulsewise_backend::services::{AdviceService, EmailService, GoogleSheetsSource, SchedulerService};
use pulsewise_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Panic if we can't read the config
    let config = get_config().expect("Failed to read the config.");

    let subscriber = get_subscriber(
        "pulsewise-backend".into(),
        config.application.log_level.clone(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    let jwt_settings = get_jwt_settings(&config);

    // Only try to establish connection when actually used
    let connection_pool = PgPoolOptions::new()
        .max_connections(32)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_lazy(config.database.connection_string().expose_secret())
        .expect("Failed to create Postgres connection pool");

    if let Err(e) = sqlx::migrate!("./migrations").run(&connection_pool).await {
        tracing::error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    let email_service = EmailService::new(&config.email).expect("Invalid email configuration");
    let advice_service = AdviceService::new(config.advice.clone()).expect("Failed to create advice client");

    let import_target = if config.import.enabled {
        let source = GoogleSheetsSource::new(config.import.clone()).expect("Failed to create Sheets client");
        tracing::info!("Spreadsheet import enabled for {}", config.import.source_id());
        Some(ImportTarget::new(Arc::new(source), config.import.page_size))
    } else {
        None
    };

    let scheduler_service = match SchedulerService::new(
        connection_pool.clone(),
        config.scheduler.clone(),
        email_service.clone(),
        import_target.clone(),
    )
    .await
    {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!("Failed to create scheduler service: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = scheduler_service.start().await {
        tracing::error!("Failed to start scheduler: {}", e);
        std::process::exit(1);
    }

    let listener = TcpListener::bind(config.application.address())?;
    tracing::info!("Listening on {}", config.application.address());

    run(
        listener,
        connection_pool,
        jwt_settings,
        email_service,
        advice_service,
        import_target,
    )?
    .await?;

    if let Err(e) = scheduler_service.stop().await {
        tracing::error!("Failed to stop scheduler cleanly: {}", e);
    }
    Ok(())
}
