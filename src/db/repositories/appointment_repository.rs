use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Appointment, AppointmentStatus, NewAppointment};
use crate::db::DatabaseError;

const APPOINTMENT_COLUMNS: &str =
    "appointment_uuid, student_uuid, teacher_uuid, availability_uuid, start_date, end_date, status";

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Inserts a new appointment as `Scheduled` and returns its id. The
    /// uniqueness constraints on `availability_uuid` and on
    /// `(student_uuid, start_date)` surface concurrent double-booking as
    /// `DatabaseError::Duplicate` with the constraint name.
    async fn insert(&self, new: &NewAppointment) -> Result<Uuid, DatabaseError>;

    async fn find_by_id(&self, appointment_uuid: Uuid) -> Result<Option<Appointment>, DatabaseError>;

    /// Appointments inside the range where the user is the student or the
    /// teacher.
    async fn find_for_user_in_range(
        &self,
        user_uuid: Uuid,
        start_date: i64,
        end_date: i64,
    ) -> Result<Vec<Appointment>, DatabaseError>;

    async fn delete(&self, appointment_uuid: Uuid) -> Result<(), DatabaseError>;

    /// Deletes the appointment and its referenced availability in one
    /// transaction. Partial failure rolls back both deletes.
    async fn delete_with_availability(
        &self,
        appointment_uuid: Uuid,
        availability_uuid: Uuid,
    ) -> Result<(), DatabaseError>;

    /// Count of Finished appointments; the sole input of the quota guard.
    async fn count_finished_for_student(&self, student_uuid: Uuid) -> Result<i64, DatabaseError>;

    async fn exists_for_student_at(
        &self,
        student_uuid: Uuid,
        start_date: i64,
    ) -> Result<bool, DatabaseError>;

    /// Appointments with `from_exclusive < start_date <= to_inclusive`,
    /// the reminder-sweep window.
    async fn find_starting_between(
        &self,
        from_exclusive: i64,
        to_inclusive: i64,
    ) -> Result<Vec<Appointment>, DatabaseError>;

    /// Ids of Scheduled appointments whose end date has passed.
    async fn find_scheduled_ended_before(&self, now: i64) -> Result<Vec<Uuid>, DatabaseError>;

    async fn mark_finished(&self, ids: &[Uuid]) -> Result<u64, DatabaseError>;
}

pub struct PgAppointmentRepository {
    pool: PgPool,
}

impl PgAppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for PgAppointmentRepository {
    async fn insert(&self, new: &NewAppointment) -> Result<Uuid, DatabaseError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO appointment
                (student_uuid, teacher_uuid, availability_uuid, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING appointment_uuid
            "#,
        )
        .bind(new.student_uuid)
        .bind(new.teacher_uuid)
        .bind(new.availability_uuid)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(AppointmentStatus::Scheduled)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_by_id(&self, appointment_uuid: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointment WHERE appointment_uuid = $1");

        let row = sqlx::query_as::<_, Appointment>(&sql)
            .bind(appointment_uuid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_for_user_in_range(
        &self,
        user_uuid: Uuid,
        start_date: i64,
        end_date: i64,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointment
            WHERE (teacher_uuid = $1 OR student_uuid = $1)
              AND start_date >= $2 AND end_date <= $3
            ORDER BY start_date
            "#
        );

        let rows = sqlx::query_as::<_, Appointment>(&sql)
            .bind(user_uuid)
            .bind(start_date)
            .bind(end_date)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn delete(&self, appointment_uuid: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM appointment WHERE appointment_uuid = $1")
            .bind(appointment_uuid)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_with_availability(
        &self,
        appointment_uuid: Uuid,
        availability_uuid: Uuid,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM appointment WHERE appointment_uuid = $1")
            .bind(appointment_uuid)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM availability WHERE availability_uuid = $1")
            .bind(availability_uuid)
            .execute(&mut *tx)
            .await?;

        // Dropping the transaction without commit rolls both deletes back.
        tx.commit().await?;
        Ok(())
    }

    async fn count_finished_for_student(&self, student_uuid: Uuid) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(appointment_uuid)
            FROM appointment
            WHERE student_uuid = $1 AND status = $2
            "#,
        )
        .bind(student_uuid)
        .bind(AppointmentStatus::Finished)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn exists_for_student_at(
        &self,
        student_uuid: Uuid,
        start_date: i64,
    ) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM appointment
                WHERE student_uuid = $1 AND start_date = $2
            )
            "#,
        )
        .bind(student_uuid)
        .bind(start_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_starting_between(
        &self,
        from_exclusive: i64,
        to_inclusive: i64,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointment
            WHERE start_date > $1 AND start_date <= $2
            "#
        );

        let rows = sqlx::query_as::<_, Appointment>(&sql)
            .bind(from_exclusive)
            .bind(to_inclusive)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_scheduled_ended_before(&self, now: i64) -> Result<Vec<Uuid>, DatabaseError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT appointment_uuid
            FROM appointment
            WHERE end_date < $1 AND status = $2
            "#,
        )
        .bind(now)
        .bind(AppointmentStatus::Scheduled)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn mark_finished(&self, ids: &[Uuid]) -> Result<u64, DatabaseError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE appointment SET status = $1 WHERE appointment_uuid = ANY($2)",
        )
        .bind(AppointmentStatus::Finished)
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
