use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

/// Caller identity resolved once per request from the gateway headers.
/// Handlers branch on this value instead of re-deriving the role inline.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_uuid: Uuid,
    pub role: Role,
}

impl AuthContext {
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role {} cannot perform this operation",
                self.role.as_str()
            )))
        }
    }

    /// The teacher an availability operation acts on. Admins must name the
    /// teacher explicitly; teachers always act on themselves.
    pub fn acting_teacher(&self, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        match self.role {
            Role::Admin => requested.ok_or(AppError::MissingTeacherUuid),
            _ => Ok(self.user_uuid),
        }
    }

    /// The user an appointment listing acts on; same admin rule.
    pub fn acting_user(&self, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        match self.role {
            Role::Admin => requested.ok_or(AppError::UserNotFound),
            _ => Ok(self.user_uuid),
        }
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_uuid = parts
            .headers
            .get("x-user-uuid")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing x-user-uuid header".to_string()))?
            .parse::<Uuid>()
            .map_err(|_| AppError::Unauthorized("invalid x-user-uuid header".to_string()))?;

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing x-user-role header".to_string()))?
            .parse::<Role>()
            .map_err(|_| AppError::Unauthorized("invalid x-user-role header".to_string()))?;

        Ok(AuthContext { user_uuid, role })
    }
}
