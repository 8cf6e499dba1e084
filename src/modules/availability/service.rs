use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::clients::{IdentityClient, Teacher};
use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::db::models::{Availability, NewAvailability, OpenSlot};
use crate::db::repositories::AvailabilityRepository;
use crate::error::{AppError, AppResult};
use crate::modules::availability::slots::{expand_range, range_extremum, SlotInterval};

/// One open start date plus every teacher eligible to teach it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDetail {
    pub availability_uuid: Uuid,
    pub start_date: i64,
    pub end_date: i64,
    pub teachers: Vec<Teacher>,
}

pub struct AvailabilityService {
    repository: Arc<dyn AvailabilityRepository>,
    identity: Arc<dyn IdentityClient>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl AvailabilityService {
    pub fn new(
        repository: Arc<dyn AvailabilityRepository>,
        identity: Arc<dyn IdentityClient>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            repository,
            identity,
            clock,
            config,
        }
    }

    /// Expands the submitted ranges into slots, drops the ones the teacher
    /// already has (dedup by start date) and persists the rest.
    pub async fn create_availability(
        &self,
        teacher_uuid: Uuid,
        dates: &[SlotInterval],
    ) -> AppResult<Vec<Uuid>> {
        let teacher = self
            .identity
            .get_teacher(teacher_uuid)
            .await?
            .ok_or(AppError::TeacherNotFound)?;

        for range in dates {
            self.validate_range(range.start_date, range.end_date)?;
        }

        let intervals: Vec<SlotInterval> = dates
            .iter()
            .flat_map(|range| {
                expand_range(range.start_date, range.end_date, self.config.slot_duration_min)
            })
            .collect();

        let Some((min_date, max_date)) = range_extremum(&intervals) else {
            return Ok(Vec::new());
        };

        let existing = self
            .repository
            .find_by_teacher_in_range(teacher_uuid, min_date, max_date)
            .await?;
        let existing_starts: HashSet<i64> =
            existing.iter().map(|a| a.start_date).collect();

        let to_add: Vec<NewAvailability> = intervals
            .into_iter()
            .filter(|slot| !existing_starts.contains(&slot.start_date))
            .map(|slot| NewAvailability {
                teacher_uuid,
                start_date: slot.start_date,
                end_date: slot.end_date,
                language: teacher.language.clone(),
            })
            .collect();

        if to_add.is_empty() {
            return Ok(Vec::new());
        }

        let ids = self.repository.insert_batch(&to_add).await?;
        info!(teacher = %teacher_uuid, created = ids.len(), "availability slots created");

        Ok(ids)
    }

    /// Rejects the whole batch unless every id is an open slot owned by the
    /// teacher.
    pub async fn delete_availabilities(
        &self,
        teacher_uuid: Uuid,
        availability_uuids: &[Uuid],
    ) -> AppResult<()> {
        if availability_uuids.is_empty() {
            return Err(AppError::Validation(
                "no availabilities selected".to_string(),
            ));
        }

        let open = self
            .repository
            .find_open_by_ids(availability_uuids, teacher_uuid)
            .await?;

        if open.len() != availability_uuids.len() {
            return Err(AppError::AvailabilityNotFound);
        }

        self.repository.delete_by_ids(availability_uuids).await?;
        Ok(())
    }

    pub async fn get_teacher_availabilities(
        &self,
        teacher_uuid: Uuid,
    ) -> AppResult<Vec<Availability>> {
        Ok(self.repository.find_by_teacher(teacher_uuid).await?)
    }

    /// Open slots in the range for one language, collapsed to one entry per
    /// start date across teachers.
    pub async fn get_open_slots(
        &self,
        start_date: i64,
        end_date: i64,
        language: &str,
    ) -> AppResult<Vec<OpenSlot>> {
        self.validate_range(start_date, end_date)?;

        let slots = self
            .repository
            .find_open_in_range(start_date, end_date, language)
            .await?;

        let mut seen = HashSet::new();
        Ok(slots
            .into_iter()
            .filter(|slot| seen.insert(slot.start_date))
            .collect())
    }

    pub async fn get_availability_detail(
        &self,
        start_date: i64,
        language: &str,
    ) -> AppResult<AvailabilityDetail> {
        let availabilities = self.repository.find_open_at(start_date, language).await?;

        let Some(first) = availabilities.first() else {
            return Err(AppError::AvailabilityNotFound);
        };

        let teacher_uuids: Vec<Uuid> =
            availabilities.iter().map(|a| a.teacher_uuid).collect();
        let teachers = self.identity.get_teachers(&teacher_uuids).await?;

        Ok(AvailabilityDetail {
            availability_uuid: first.availability_uuid,
            start_date: first.start_date,
            end_date: first.end_date,
            teachers,
        })
    }

    fn validate_range(&self, start_date: i64, end_date: i64) -> AppResult<()> {
        if end_date <= start_date {
            return Err(AppError::InvalidDateRange {
                start_date,
                end_date,
            });
        }

        if start_date <= self.clock.now_unix() {
            return Err(AppError::DateInPast { start_date });
        }

        Ok(())
    }
}
