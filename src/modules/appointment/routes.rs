use axum::{routing::post, Router};

use crate::app_state::AppState;

use super::handlers::{
    cancel_appointment, create_appointment, get_appointments, remove_appointment,
};

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_appointment)
                .get(get_appointments)
                .delete(remove_appointment),
        )
        .route("/cancel", post(cancel_appointment))
}
