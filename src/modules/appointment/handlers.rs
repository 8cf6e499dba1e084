use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::{AuthContext, Role};
use crate::db::models::Appointment;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub teacher_uuid: Uuid,
    pub availability_uuid: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentResponse {
    pub appointment_uuid: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAppointmentsQuery {
    pub start_date: i64,
    pub end_date: i64,
    pub user_uuid: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAppointmentRequest {
    pub appointment_uuid: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentRequest {
    pub appointment_uuid: Uuid,
    #[validate(length(max = 500, message = "message is too long"))]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentResponse {
    pub availability_uuid: Uuid,
}

pub async fn create_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(dto): Json<CreateAppointmentRequest>,
) -> AppResult<Json<CreateAppointmentResponse>> {
    auth.require(&[Role::Student])?;

    let appointment_uuid = state
        .appointments
        .create_appointment(auth.user_uuid, dto.teacher_uuid, dto.availability_uuid)
        .await?;

    Ok(Json(CreateAppointmentResponse { appointment_uuid }))
}

pub async fn get_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<GetAppointmentsQuery>,
) -> AppResult<Json<Vec<Appointment>>> {
    let user_uuid = auth.acting_user(query.user_uuid)?;
    let appointments = state
        .appointments
        .get_appointments(user_uuid, query.start_date, query.end_date)
        .await?;

    Ok(Json(appointments))
}

pub async fn remove_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(dto): Json<RemoveAppointmentRequest>,
) -> AppResult<StatusCode> {
    auth.require(&[Role::Student])?;

    state
        .appointments
        .remove_appointment(dto.appointment_uuid, auth.user_uuid)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(dto): Json<CancelAppointmentRequest>,
) -> AppResult<Json<CancelAppointmentResponse>> {
    auth.require(&[Role::Teacher])?;
    dto.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let availability_uuid = state
        .appointments
        .cancel_appointment(dto.appointment_uuid, auth.user_uuid, &dto.message)
        .await?;

    Ok(Json(CancelAppointmentResponse { availability_uuid }))
}
