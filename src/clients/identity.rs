use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;
use crate::error::AppError;

use super::{status_error, transport_error};

const SERVICE: &str = "user-service";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_uuid: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub teacher_uuid: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub language: String,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEmailInfo {
    pub user_uuid: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Identity collaborator: user and teacher lookups. Every call is bounded by
/// the client deadline; an absent record is `None`, not an error.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    async fn get_user(&self, user_uuid: Uuid, role: Role) -> Result<Option<User>, AppError>;

    async fn get_teacher(&self, teacher_uuid: Uuid) -> Result<Option<Teacher>, AppError>;

    async fn get_teachers(&self, teacher_uuids: &[Uuid]) -> Result<Vec<Teacher>, AppError>;

    async fn get_users_email_info(
        &self,
        user_uuids: &[Uuid],
    ) -> Result<Vec<UserEmailInfo>, AppError>;
}

pub struct HttpIdentityClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpIdentityClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn get_user(&self, user_uuid: Uuid, role: Role) -> Result<Option<User>, AppError> {
        let url = format!("{}/internal/users/{}", self.base_url, user_uuid);

        let response = self
            .client
            .get(&url)
            .query(&[("role", role.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let user = response
                    .json::<User>()
                    .await
                    .map_err(|e| transport_error(SERVICE, e))?;
                Ok(Some(user))
            }
            status => Err(status_error(SERVICE, status)),
        }
    }

    async fn get_teacher(&self, teacher_uuid: Uuid) -> Result<Option<Teacher>, AppError> {
        let url = format!("{}/internal/teachers/{}", self.base_url, teacher_uuid);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let teacher = response
                    .json::<Teacher>()
                    .await
                    .map_err(|e| transport_error(SERVICE, e))?;
                Ok(Some(teacher))
            }
            status => Err(status_error(SERVICE, status)),
        }
    }

    async fn get_teachers(&self, teacher_uuids: &[Uuid]) -> Result<Vec<Teacher>, AppError> {
        let url = format!("{}/internal/teachers/batch", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&teacher_uuids)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response.status()));
        }

        response
            .json::<Vec<Teacher>>()
            .await
            .map_err(|e| transport_error(SERVICE, e))
    }

    async fn get_users_email_info(
        &self,
        user_uuids: &[Uuid],
    ) -> Result<Vec<UserEmailInfo>, AppError> {
        let url = format!("{}/internal/users/email-info", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&user_uuids)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response.status()));
        }

        response
            .json::<Vec<UserEmailInfo>>()
            .await
            .map_err(|e| transport_error(SERVICE, e))
    }
}
