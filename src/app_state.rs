use std::sync::Arc;

use sqlx::PgPool;

use crate::config;
use crate::modules::appointment::AppointmentService;
use crate::modules::availability::AvailabilityService;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub env: config::Config,
    pub availability: Arc<AvailabilityService>,
    pub appointments: Arc<AppointmentService>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        env: config::Config,
        availability: Arc<AvailabilityService>,
        appointments: Arc<AppointmentService>,
    ) -> Self {
        Self {
            db,
            env,
            availability,
            appointments,
        }
    }
}
