use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Availability, NewAvailability, OpenSlot};
use crate::db::DatabaseError;

/// A slot is open iff no appointment row references it. Kept as a single
/// reusable fragment so every open-filtered query shares the same predicate.
const OPEN_PREDICATE: &str =
    "NOT EXISTS (SELECT 1 FROM appointment ap WHERE ap.availability_uuid = a.availability_uuid)";

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Persists a batch of generated slots, returning the new ids in order.
    async fn insert_batch(&self, slots: &[NewAvailability]) -> Result<Vec<Uuid>, DatabaseError>;

    async fn find_by_teacher(&self, teacher_uuid: Uuid) -> Result<Vec<Availability>, DatabaseError>;

    /// All slots of one teacher whose span falls inside `[start_date, end_date]`,
    /// open or not. Bounds the dedup existence check to one query per submission.
    async fn find_by_teacher_in_range(
        &self,
        teacher_uuid: Uuid,
        start_date: i64,
        end_date: i64,
    ) -> Result<Vec<Availability>, DatabaseError>;

    /// Open slots inside the range for one language, ordered by start date.
    async fn find_open_in_range(
        &self,
        start_date: i64,
        end_date: i64,
        language: &str,
    ) -> Result<Vec<OpenSlot>, DatabaseError>;

    /// Open slots starting exactly at `start_date` for one language, one per
    /// eligible teacher.
    async fn find_open_at(
        &self,
        start_date: i64,
        language: &str,
    ) -> Result<Vec<Availability>, DatabaseError>;

    /// Of the given ids, the ones that are open and owned by the teacher.
    async fn find_open_by_ids(
        &self,
        ids: &[Uuid],
        teacher_uuid: Uuid,
    ) -> Result<Vec<Availability>, DatabaseError>;

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64, DatabaseError>;
}

pub struct PgAvailabilityRepository {
    pool: PgPool,
}

impl PgAvailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for PgAvailabilityRepository {
    async fn insert_batch(&self, slots: &[NewAvailability]) -> Result<Vec<Uuid>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(slots.len());

        for slot in slots {
            let id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO availability (teacher_uuid, start_date, end_date, language)
                VALUES ($1, $2, $3, $4)
                RETURNING availability_uuid
                "#,
            )
            .bind(slot.teacher_uuid)
            .bind(slot.start_date)
            .bind(slot.end_date)
            .bind(&slot.language)
            .fetch_one(&mut *tx)
            .await?;

            ids.push(id);
        }

        tx.commit().await?;
        Ok(ids)
    }

    async fn find_by_teacher(&self, teacher_uuid: Uuid) -> Result<Vec<Availability>, DatabaseError> {
        let rows = sqlx::query_as::<_, Availability>(
            r#"
            SELECT availability_uuid, teacher_uuid, start_date, end_date, language
            FROM availability
            WHERE teacher_uuid = $1
            ORDER BY start_date
            "#,
        )
        .bind(teacher_uuid)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_by_teacher_in_range(
        &self,
        teacher_uuid: Uuid,
        start_date: i64,
        end_date: i64,
    ) -> Result<Vec<Availability>, DatabaseError> {
        let rows = sqlx::query_as::<_, Availability>(
            r#"
            SELECT availability_uuid, teacher_uuid, start_date, end_date, language
            FROM availability
            WHERE teacher_uuid = $1 AND start_date >= $2 AND end_date <= $3
            "#,
        )
        .bind(teacher_uuid)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_open_in_range(
        &self,
        start_date: i64,
        end_date: i64,
        language: &str,
    ) -> Result<Vec<OpenSlot>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT a.start_date, a.end_date
            FROM availability a
            WHERE a.start_date >= $1 AND a.end_date <= $2
              AND a.language = $3
              AND {OPEN_PREDICATE}
            ORDER BY a.start_date
            "#
        );

        let rows = sqlx::query_as::<_, OpenSlot>(&sql)
            .bind(start_date)
            .bind(end_date)
            .bind(language)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_open_at(
        &self,
        start_date: i64,
        language: &str,
    ) -> Result<Vec<Availability>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT a.availability_uuid, a.teacher_uuid, a.start_date, a.end_date, a.language
            FROM availability a
            WHERE a.start_date = $1
              AND a.language = $2
              AND {OPEN_PREDICATE}
            "#
        );

        let rows = sqlx::query_as::<_, Availability>(&sql)
            .bind(start_date)
            .bind(language)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_open_by_ids(
        &self,
        ids: &[Uuid],
        teacher_uuid: Uuid,
    ) -> Result<Vec<Availability>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT a.availability_uuid, a.teacher_uuid, a.start_date, a.end_date, a.language
            FROM availability a
            WHERE a.teacher_uuid = $1
              AND a.availability_uuid = ANY($2)
              AND {OPEN_PREDICATE}
            "#
        );

        let rows = sqlx::query_as::<_, Availability>(&sql)
            .bind(teacher_uuid)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM availability WHERE availability_uuid = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
