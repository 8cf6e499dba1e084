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
use crate::db::models::{Availability, OpenSlot};
use crate::error::{AppError, AppResult};
use crate::modules::availability::service::AvailabilityDetail;
use crate::modules::availability::slots::SlotInterval;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvailabilitiesRequest {
    pub teacher_uuid: Option<Uuid>,
    #[validate(length(min = 1, message = "at least one date range is required"))]
    pub dates: Vec<SlotInterval>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvailabilitiesResponse {
    pub availability_uuids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAvailabilitiesQuery {
    pub teacher_uuid: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSlotsQuery {
    pub start_date: i64,
    pub end_date: i64,
    pub language: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDetailQuery {
    pub start_date: i64,
    pub language: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAvailabilitiesRequest {
    pub teacher_uuid: Option<Uuid>,
    #[validate(length(min = 1, message = "at least one availability is required"))]
    pub availability_uuids: Vec<Uuid>,
}

pub async fn create_availabilities(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(dto): Json<CreateAvailabilitiesRequest>,
) -> AppResult<Json<CreateAvailabilitiesResponse>> {
    auth.require(&[Role::Teacher, Role::Admin])?;
    dto.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let teacher_uuid = auth.acting_teacher(dto.teacher_uuid)?;
    let availability_uuids = state
        .availability
        .create_availability(teacher_uuid, &dto.dates)
        .await?;

    Ok(Json(CreateAvailabilitiesResponse { availability_uuids }))
}

pub async fn get_teacher_availabilities(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<TeacherAvailabilitiesQuery>,
) -> AppResult<Json<Vec<Availability>>> {
    auth.require(&[Role::Teacher, Role::Admin])?;

    let teacher_uuid = auth.acting_teacher(query.teacher_uuid)?;
    let availabilities = state
        .availability
        .get_teacher_availabilities(teacher_uuid)
        .await?;

    Ok(Json(availabilities))
}

pub async fn get_open_slots(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<OpenSlotsQuery>,
) -> AppResult<Json<Vec<OpenSlot>>> {
    auth.require(&[Role::Student, Role::Admin])?;

    let slots = state
        .availability
        .get_open_slots(query.start_date, query.end_date, &query.language)
        .await?;

    Ok(Json(slots))
}

pub async fn get_availability_detail(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<AvailabilityDetailQuery>,
) -> AppResult<Json<AvailabilityDetail>> {
    auth.require(&[Role::Student, Role::Admin])?;

    let detail = state
        .availability
        .get_availability_detail(query.start_date, &query.language)
        .await?;

    Ok(Json(detail))
}

pub async fn delete_availabilities(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(dto): Json<DeleteAvailabilitiesRequest>,
) -> AppResult<StatusCode> {
    auth.require(&[Role::Teacher, Role::Admin])?;
    dto.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let teacher_uuid = auth.acting_teacher(dto.teacher_uuid)?;
    state
        .availability
        .delete_availabilities(teacher_uuid, &dto.availability_uuids)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
