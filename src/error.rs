use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Date to should be after date from")]
    InvalidDateRange { start_date: i64, end_date: i64 },

    #[error("Date from should be in the future")]
    DateInPast { start_date: i64 },

    #[error("Please select a teacher")]
    MissingTeacherUuid,

    #[error("We couldn't find a teacher. Please contact support.")]
    TeacherNotFound,

    #[error("Student not found. Please contact support.")]
    StudentNotFound,

    #[error("User not found. Please contact support.")]
    UserNotFound,

    #[error("Order not found. Please contact support.")]
    OrderNotFound,

    #[error("We couldn't find an availability. Please contact support.")]
    AvailabilityNotFound,

    #[error("Appointment not found. Please contact support.")]
    AppointmentNotFound,

    #[error("You cannot add an appointment less than {0} hours before it starts. Please contact support.")]
    IncorrectAddDate(i64),

    #[error("You cannot remove an appointment less than {0} hours before it starts. Please contact support.")]
    IncorrectRemoveDate(i64),

    #[error("You have no more appointments left. Please contact support.")]
    NoAppointmentsLeft,

    #[error("You already have an appointment at this time")]
    StudentHasAppointment,

    #[error("Dependency timed out: {0}")]
    DependencyTimeout(String),

    #[error("Dependency failed: {0}")]
    Dependency(String),
}

impl AppError {
    /// Stable machine-readable code, rendered alongside the human message so
    /// clients can branch without parsing prose.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database-error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Validation(_) => "validation-error",
            AppError::InvalidDateRange { .. } => "invalid-date-range",
            AppError::DateInPast { .. } => "date-in-past",
            AppError::MissingTeacherUuid => "missing-teacher-uuid",
            AppError::TeacherNotFound => "teacher-not-found",
            AppError::StudentNotFound => "student-not-found",
            AppError::UserNotFound => "user-not-found",
            AppError::OrderNotFound => "order-not-found",
            AppError::AvailabilityNotFound => "availability-not-found",
            AppError::AppointmentNotFound => "appointment-not-found",
            AppError::IncorrectAddDate(_) => "incorrect-add-date",
            AppError::IncorrectRemoveDate(_) => "incorrect-remove-date",
            AppError::NoAppointmentsLeft => "no-appointments-left",
            AppError::StudentHasAppointment => "student-has-appointment",
            AppError::DependencyTimeout(_) => "dependency-timeout",
            AppError::Dependency(_) => "dependency-failed",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(err) => match err {
                DatabaseError::NotFound => StatusCode::NOT_FOUND,
                DatabaseError::Duplicate(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DependencyTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            // Business-rule failures are client errors, matching the
            // contract the clients already speak.
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
