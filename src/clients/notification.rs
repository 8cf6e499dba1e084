use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

use super::{status_error, transport_error};

const SERVICE: &str = "notification-service";

/// One reminder record: appointment coordinates plus both parties' contact
/// info, assembled by the reminder sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub student_uuid: Uuid,
    pub teacher_uuid: Uuid,
    pub start_date: i64,
    pub teacher_first_name: String,
    pub teacher_last_name: String,
    pub teacher_email: String,
    pub student_first_name: String,
    pub student_last_name: String,
    pub student_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderBatch {
    pub reminders: Vec<Reminder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRecord {
    pub appointment_uuid: Uuid,
    pub student_uuid: Uuid,
    pub teacher_uuid: Uuid,
    pub start_date: i64,
    pub message: String,
}

/// Notification collaborator. Fire-and-forget: callers log failures and move
/// on; there is no delivery guarantee.
#[async_trait]
pub trait NotificationClient: Send + Sync {
    async fn send_reminders(&self, batch: &ReminderBatch) -> Result<bool, AppError>;

    async fn send_cancellation(&self, record: &CancellationRecord) -> Result<bool, AppError>;
}

pub struct HttpNotificationClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpNotificationClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    async fn post_ack<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<bool, AppError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response.status()));
        }

        response
            .json::<bool>()
            .await
            .map_err(|e| transport_error(SERVICE, e))
    }
}

#[async_trait]
impl NotificationClient for HttpNotificationClient {
    async fn send_reminders(&self, batch: &ReminderBatch) -> Result<bool, AppError> {
        self.post_ack("/internal/notifications/reminders", batch).await
    }

    async fn send_cancellation(&self, record: &CancellationRecord) -> Result<bool, AppError> {
        self.post_ack("/internal/notifications/cancellations", record).await
    }
}
