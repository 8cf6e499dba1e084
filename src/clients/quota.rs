use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

use super::{status_error, transport_error};

const SERVICE: &str = "order-service";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOrdersQuantity {
    pub total_quantity: i64,
}

/// Quota collaborator: how many sessions a student has purchased in total.
#[async_trait]
pub trait QuotaClient: Send + Sync {
    async fn get_student_total_quantity(
        &self,
        student_uuid: Uuid,
    ) -> Result<Option<StudentOrdersQuantity>, AppError>;
}

pub struct HttpQuotaClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpQuotaClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl QuotaClient for HttpQuotaClient {
    async fn get_student_total_quantity(
        &self,
        student_uuid: Uuid,
    ) -> Result<Option<StudentOrdersQuantity>, AppError> {
        let url = format!(
            "{}/internal/students/{}/total-quantity",
            self.base_url, student_uuid
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let quantity = response
                    .json::<StudentOrdersQuantity>()
                    .await
                    .map_err(|e| transport_error(SERVICE, e))?;
                Ok(Some(quantity))
            }
            status => Err(status_error(SERVICE, status)),
        }
    }
}
