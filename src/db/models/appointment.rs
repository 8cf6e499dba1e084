use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Finished,
}

/// A booked slot. `availability_uuid` is a back-reference: the availability
/// row is consumed by the mere existence of this row and freed again only if
/// this row is deleted. Status moves `Scheduled -> Finished` once, driven by
/// the finished sweep; cancellation and removal are hard deletes.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_uuid: Uuid,
    pub student_uuid: Uuid,
    pub teacher_uuid: Uuid,
    pub availability_uuid: Uuid,
    pub start_date: i64,
    pub end_date: i64,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub student_uuid: Uuid,
    pub teacher_uuid: Uuid,
    pub availability_uuid: Uuid,
    pub start_date: i64,
    pub end_date: i64,
}
