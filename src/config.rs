use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub sweeps: SweepConfig,
    pub microservices: MicroserviceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

/// Knobs of the booking core. Injected into the services at construction;
/// nothing reads these through the global after startup.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SchedulerConfig {
    /// Width of one bookable slot in minutes.
    pub slot_duration_min: i64,
    /// Booking lead time: a slot whose start is further than this many hours
    /// into the past of the allowed window cannot be booked.
    pub hours_to_add: i64,
    /// Removal lead time, configured independently from the add window.
    pub hours_to_remove: i64,
    /// Forward-looking reminder window in minutes.
    pub reminder_window_min: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SweepConfig {
    pub reminder_interval_secs: u64,
    pub finished_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MicroserviceConfig {
    pub user_service_url: String,
    pub order_service_url: String,
    pub notification_service_url: String,
    pub timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MAX_CONNECTIONS")?),
            Err(_) => Some(10),
        };
        let db_min_connections = match env::var("DATABASE_MIN_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MIN_CONNECTIONS")?),
            Err(_) => Some(1),
        };

        let scheduler = SchedulerConfig {
            slot_duration_min: parse_or("AVAILABILITY_SLOT_IN_MIN", 30)?,
            hours_to_add: parse_or("HOURS_TO_ADD_APPOINTMENT", 2)?,
            hours_to_remove: parse_or("HOURS_TO_REMOVE_APPOINTMENT", 24)?,
            reminder_window_min: parse_or("REMINDER_WINDOW_IN_MIN", 30)?,
        };

        let sweeps = SweepConfig {
            reminder_interval_secs: parse_or("REMINDER_SWEEP_INTERVAL_SECS", 60)?,
            finished_interval_secs: parse_or("FINISHED_SWEEP_INTERVAL_SECS", 60)?,
        };

        let microservices = MicroserviceConfig {
            user_service_url: env::var("USER_SERVICE_URL").context("USER_SERVICE_URL must be set")?,
            order_service_url: env::var("ORDER_SERVICE_URL").context("ORDER_SERVICE_URL must be set")?,
            notification_service_url: env::var("NOTIFICATION_SERVICE_URL")
                .context("NOTIFICATION_SERVICE_URL must be set")?,
            timeout_ms: parse_or("MICROSERVICE_TIMEOUT_MS", 2500)?,
        };

        Ok(Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections: db_max_connections,
                min_connections: db_min_connections,
            },
            scheduler,
            sweeps,
            microservices,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => val.parse().with_context(|| format!("Failed to parse {}", key)),
        Err(_) => Ok(default),
    }
}

// Use once_cell for a global config instance that's initialized once
use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}

pub fn get() -> &'static Config {
    CONFIG.get().expect("Config is not initialized")
}
