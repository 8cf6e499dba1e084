use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutor_scheduler::{
    app::create_router,
    app_state::AppState,
    clients::{self, HttpIdentityClient, HttpNotificationClient, HttpQuotaClient},
    clock::SystemClock,
    config::{self, SweepConfig},
    db,
    db::repositories::{PgAppointmentRepository, PgAvailabilityRepository},
    modules::{appointment::AppointmentService, availability::AvailabilityService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv().ok();

    let config = config::init()?.clone();
    let pool = db::init_pool().await?;

    let http = clients::build_http_client(config.microservices.timeout_ms)?;
    let identity = Arc::new(HttpIdentityClient::new(
        config.microservices.user_service_url.clone(),
        http.clone(),
    ));
    let quota = Arc::new(HttpQuotaClient::new(
        config.microservices.order_service_url.clone(),
        http.clone(),
    ));
    let notifier = Arc::new(HttpNotificationClient::new(
        config.microservices.notification_service_url.clone(),
        http,
    ));
    let clock = Arc::new(SystemClock);

    let availability_repo = Arc::new(PgAvailabilityRepository::new(pool.clone()));
    let appointment_repo = Arc::new(PgAppointmentRepository::new(pool.clone()));

    let availability = Arc::new(AvailabilityService::new(
        availability_repo.clone(),
        identity.clone(),
        clock.clone(),
        config.scheduler,
    ));
    let appointments = Arc::new(AppointmentService::new(
        appointment_repo,
        availability_repo,
        identity,
        quota,
        notifier,
        clock,
        config.scheduler,
    ));

    spawn_sweeps(appointments.clone(), config.sweeps);

    let state = AppState::new(pool, config.clone(), availability, appointments);
    let app = create_router(state);

    let addr = config.server_addr();
    info!("tutor-scheduler listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Failed to serve application")?;

    Ok(())
}

/// Spawns the two time-driven sweeps. One instance of each runs per process;
/// a failed tick is logged and the loop keeps going.
fn spawn_sweeps(appointments: Arc<AppointmentService>, sweeps: SweepConfig) {
    let reminder_service = appointments.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(sweeps.reminder_interval_secs));
        loop {
            ticker.tick().await;
            if let Err(err) = reminder_service.run_reminder_sweep().await {
                error!(error = %err, "reminder sweep failed");
            }
        }
    });

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(sweeps.finished_interval_secs));
        loop {
            ticker.tick().await;
            if let Err(err) = appointments.run_finished_sweep().await {
                error!(error = %err, "finished sweep failed");
            }
        }
    });
}
