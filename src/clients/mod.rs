pub mod identity;
pub mod notification;
pub mod quota;

use std::time::Duration;

use crate::error::AppError;

pub use identity::{HttpIdentityClient, IdentityClient, Teacher, User, UserEmailInfo};
pub use notification::{
    CancellationRecord, HttpNotificationClient, NotificationClient, Reminder, ReminderBatch,
};
pub use quota::{HttpQuotaClient, QuotaClient, StudentOrdersQuantity};

/// Builds the shared HTTP client with the collaborator deadline. A call that
/// outlives the deadline is a dependency failure, never a success.
pub fn build_http_client(timeout_ms: u64) -> Result<reqwest::Client, anyhow::Error> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?)
}

fn transport_error(service: &'static str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::DependencyTimeout(service.to_string())
    } else {
        AppError::Dependency(format!("{}: {}", service, err))
    }
}

fn status_error(service: &'static str, status: reqwest::StatusCode) -> AppError {
    AppError::Dependency(format!("{} returned status {}", service, status))
}
