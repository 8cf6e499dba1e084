use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

/// One bookable unit of fixed duration. Rows are created in batches by the
/// slot generator, never mutated, and deleted either by the owning teacher
/// or when a teacher cancels the appointment that consumed them.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Availability {
    pub availability_uuid: Uuid,
    pub teacher_uuid: Uuid,
    pub start_date: i64,
    pub end_date: i64,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAvailability {
    pub teacher_uuid: Uuid,
    pub start_date: i64,
    pub end_date: i64,
    pub language: String,
}

/// Projection used by the open-slot listing; slots from different teachers
/// sharing a start date collapse into one entry.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OpenSlot {
    pub start_date: i64,
    pub end_date: i64,
}
