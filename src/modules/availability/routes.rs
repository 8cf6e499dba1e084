use axum::{routing::get, routing::post, Router};

use crate::app_state::AppState;

use super::handlers::{
    create_availabilities, delete_availabilities, get_availability_detail, get_open_slots,
    get_teacher_availabilities,
};

pub fn availability_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_availabilities)
                .get(get_open_slots)
                .delete(delete_availabilities),
        )
        .route("/teacher", get(get_teacher_availabilities))
        .route("/details", get(get_availability_detail))
}
