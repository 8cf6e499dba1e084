//! In-memory fakes for the repository and collaborator seams, used by the
//! service unit tests. The store enforces the same uniqueness rules as the
//! scheduler migration so the guard-chain backstop paths are exercisable.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::Role;
use crate::clients::{
    CancellationRecord, IdentityClient, NotificationClient, QuotaClient, Reminder, ReminderBatch,
    StudentOrdersQuantity, Teacher, User, UserEmailInfo,
};
use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::db::models::{
    Appointment, AppointmentStatus, Availability, NewAppointment, NewAvailability, OpenSlot,
};
use crate::db::repositories::{AppointmentRepository, AvailabilityRepository};
use crate::db::DatabaseError;
use crate::error::AppError;

pub mod fixtures {
    use super::SchedulerConfig;

    pub fn scheduler_config() -> SchedulerConfig {
        SchedulerConfig {
            slot_duration_min: 30,
            hours_to_add: 2,
            hours_to_remove: 24,
            reminder_window_min: 30,
        }
    }
}

pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Backs both repository traits with plain vectors, mirroring the uniqueness
/// constraints of the real schema.
#[derive(Default)]
pub struct InMemoryStore {
    availabilities: Mutex<Vec<Availability>>,
    appointments: Mutex<Vec<Appointment>>,
    fail_availability_delete: AtomicBool,
    next_insert_error: Mutex<Option<DatabaseError>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_availability(
        &self,
        teacher_uuid: Uuid,
        start_date: i64,
        end_date: i64,
        language: &str,
    ) -> Uuid {
        let availability_uuid = Uuid::new_v4();
        self.availabilities.lock().unwrap().push(Availability {
            availability_uuid,
            teacher_uuid,
            start_date,
            end_date,
            language: language.to_string(),
        });
        availability_uuid
    }

    pub fn seed_appointment(
        &self,
        teacher_uuid: Uuid,
        student_uuid: Uuid,
        availability_uuid: Uuid,
        start_date: i64,
        end_date: i64,
    ) -> Uuid {
        let appointment_uuid = Uuid::new_v4();
        self.appointments.lock().unwrap().push(Appointment {
            appointment_uuid,
            student_uuid,
            teacher_uuid,
            availability_uuid,
            start_date,
            end_date,
            status: AppointmentStatus::Scheduled,
        });
        appointment_uuid
    }

    /// Seeds `count` already-Finished appointments far in the past, away
    /// from any start date the tests book against.
    pub fn seed_finished_appointments(&self, student_uuid: Uuid, count: usize) {
        let mut appointments = self.appointments.lock().unwrap();
        for i in 0..count {
            let start_date = -10_000 - (i as i64) * 1_000;
            appointments.push(Appointment {
                appointment_uuid: Uuid::new_v4(),
                student_uuid,
                teacher_uuid: Uuid::new_v4(),
                availability_uuid: Uuid::new_v4(),
                start_date,
                end_date: start_date + 60,
                status: AppointmentStatus::Finished,
            });
        }
    }

    pub fn appointment(&self, appointment_uuid: Uuid) -> Option<Appointment> {
        self.appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.appointment_uuid == appointment_uuid)
            .cloned()
    }

    pub fn availability(&self, availability_uuid: Uuid) -> Option<Availability> {
        self.availabilities
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.availability_uuid == availability_uuid)
            .cloned()
    }

    pub fn finished_count(&self, student_uuid: Uuid) -> i64 {
        self.appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.student_uuid == student_uuid && a.status == AppointmentStatus::Finished)
            .count() as i64
    }

    pub fn fail_availability_delete(&self, fail: bool) {
        self.fail_availability_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_next_insert_with(&self, err: DatabaseError) {
        *self.next_insert_error.lock().unwrap() = Some(err);
    }

    fn occupied_ids(&self) -> HashSet<Uuid> {
        self.appointments
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.availability_uuid)
            .collect()
    }
}

#[async_trait]
impl AvailabilityRepository for InMemoryStore {
    async fn insert_batch(&self, slots: &[NewAvailability]) -> Result<Vec<Uuid>, DatabaseError> {
        let mut rows = self.availabilities.lock().unwrap();
        let mut ids = Vec::with_capacity(slots.len());

        for slot in slots {
            if rows
                .iter()
                .any(|r| r.teacher_uuid == slot.teacher_uuid && r.start_date == slot.start_date)
            {
                return Err(DatabaseError::Duplicate(
                    "availability_teacher_start_key".to_string(),
                ));
            }
            let availability_uuid = Uuid::new_v4();
            rows.push(Availability {
                availability_uuid,
                teacher_uuid: slot.teacher_uuid,
                start_date: slot.start_date,
                end_date: slot.end_date,
                language: slot.language.clone(),
            });
            ids.push(availability_uuid);
        }

        Ok(ids)
    }

    async fn find_by_teacher(&self, teacher_uuid: Uuid) -> Result<Vec<Availability>, DatabaseError> {
        let mut rows: Vec<Availability> = self
            .availabilities
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.teacher_uuid == teacher_uuid)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.start_date);
        Ok(rows)
    }

    async fn find_by_teacher_in_range(
        &self,
        teacher_uuid: Uuid,
        start_date: i64,
        end_date: i64,
    ) -> Result<Vec<Availability>, DatabaseError> {
        Ok(self
            .availabilities
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.teacher_uuid == teacher_uuid
                    && a.start_date >= start_date
                    && a.end_date <= end_date
            })
            .cloned()
            .collect())
    }

    async fn find_open_in_range(
        &self,
        start_date: i64,
        end_date: i64,
        language: &str,
    ) -> Result<Vec<OpenSlot>, DatabaseError> {
        let occupied = self.occupied_ids();
        let mut rows: Vec<OpenSlot> = self
            .availabilities
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.start_date >= start_date
                    && a.end_date <= end_date
                    && a.language == language
                    && !occupied.contains(&a.availability_uuid)
            })
            .map(|a| OpenSlot {
                start_date: a.start_date,
                end_date: a.end_date,
            })
            .collect();
        rows.sort_by_key(|s| s.start_date);
        Ok(rows)
    }

    async fn find_open_at(
        &self,
        start_date: i64,
        language: &str,
    ) -> Result<Vec<Availability>, DatabaseError> {
        let occupied = self.occupied_ids();
        Ok(self
            .availabilities
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.start_date == start_date
                    && a.language == language
                    && !occupied.contains(&a.availability_uuid)
            })
            .cloned()
            .collect())
    }

    async fn find_open_by_ids(
        &self,
        ids: &[Uuid],
        teacher_uuid: Uuid,
    ) -> Result<Vec<Availability>, DatabaseError> {
        let occupied = self.occupied_ids();
        Ok(self
            .availabilities
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.teacher_uuid == teacher_uuid
                    && ids.contains(&a.availability_uuid)
                    && !occupied.contains(&a.availability_uuid)
            })
            .cloned()
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64, DatabaseError> {
        let mut rows = self.availabilities.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| !ids.contains(&a.availability_uuid));
        Ok((before - rows.len()) as u64)
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryStore {
    async fn insert(&self, new: &NewAppointment) -> Result<Uuid, DatabaseError> {
        if let Some(err) = self.next_insert_error.lock().unwrap().take() {
            return Err(err);
        }

        let mut rows = self.appointments.lock().unwrap();
        if rows.iter().any(|a| a.availability_uuid == new.availability_uuid) {
            return Err(DatabaseError::Duplicate(
                "appointment_availability_key".to_string(),
            ));
        }
        if rows
            .iter()
            .any(|a| a.student_uuid == new.student_uuid && a.start_date == new.start_date)
        {
            return Err(DatabaseError::Duplicate(
                "appointment_student_start_key".to_string(),
            ));
        }

        let appointment_uuid = Uuid::new_v4();
        rows.push(Appointment {
            appointment_uuid,
            student_uuid: new.student_uuid,
            teacher_uuid: new.teacher_uuid,
            availability_uuid: new.availability_uuid,
            start_date: new.start_date,
            end_date: new.end_date,
            status: AppointmentStatus::Scheduled,
        });
        Ok(appointment_uuid)
    }

    async fn find_by_id(&self, appointment_uuid: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        Ok(self.appointment(appointment_uuid))
    }

    async fn find_for_user_in_range(
        &self,
        user_uuid: Uuid,
        start_date: i64,
        end_date: i64,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let mut rows: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                (a.teacher_uuid == user_uuid || a.student_uuid == user_uuid)
                    && a.start_date >= start_date
                    && a.end_date <= end_date
            })
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.start_date);
        Ok(rows)
    }

    async fn delete(&self, appointment_uuid: Uuid) -> Result<(), DatabaseError> {
        self.appointments
            .lock()
            .unwrap()
            .retain(|a| a.appointment_uuid != appointment_uuid);
        Ok(())
    }

    async fn delete_with_availability(
        &self,
        appointment_uuid: Uuid,
        availability_uuid: Uuid,
    ) -> Result<(), DatabaseError> {
        // Simulates transactional all-or-nothing: a failing availability
        // delete leaves the appointment row untouched.
        if self.fail_availability_delete.load(Ordering::SeqCst) {
            return Err(DatabaseError::TransactionError(
                "availability delete failed".to_string(),
            ));
        }

        self.appointments
            .lock()
            .unwrap()
            .retain(|a| a.appointment_uuid != appointment_uuid);
        self.availabilities
            .lock()
            .unwrap()
            .retain(|a| a.availability_uuid != availability_uuid);
        Ok(())
    }

    async fn count_finished_for_student(&self, student_uuid: Uuid) -> Result<i64, DatabaseError> {
        Ok(self.finished_count(student_uuid))
    }

    async fn exists_for_student_at(
        &self,
        student_uuid: Uuid,
        start_date: i64,
    ) -> Result<bool, DatabaseError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.student_uuid == student_uuid && a.start_date == start_date))
    }

    async fn find_starting_between(
        &self,
        from_exclusive: i64,
        to_inclusive: i64,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.start_date > from_exclusive && a.start_date <= to_inclusive)
            .cloned()
            .collect())
    }

    async fn find_scheduled_ended_before(&self, now: i64) -> Result<Vec<Uuid>, DatabaseError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.end_date < now && a.status == AppointmentStatus::Scheduled)
            .map(|a| a.appointment_uuid)
            .collect())
    }

    async fn mark_finished(&self, ids: &[Uuid]) -> Result<u64, DatabaseError> {
        let mut updated = 0;
        for row in self.appointments.lock().unwrap().iter_mut() {
            if ids.contains(&row.appointment_uuid) {
                row.status = AppointmentStatus::Finished;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub struct FakeIdentityClient {
    users: Mutex<HashMap<Uuid, User>>,
    teachers: Mutex<HashMap<Uuid, Teacher>>,
    email_info: Mutex<HashMap<Uuid, UserEmailInfo>>,
}

impl FakeIdentityClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_teacher(&self, language: &str) -> Uuid {
        let teacher_uuid = Uuid::new_v4();
        self.teachers.lock().unwrap().insert(
            teacher_uuid,
            Teacher {
                teacher_uuid,
                first_name: "Tess".to_string(),
                last_name: "Teacher".to_string(),
                language: language.to_string(),
                description: String::new(),
                image_url: String::new(),
            },
        );
        self.email_info.lock().unwrap().insert(
            teacher_uuid,
            UserEmailInfo {
                user_uuid: teacher_uuid,
                first_name: "Tess".to_string(),
                last_name: "Teacher".to_string(),
                email: format!("{teacher_uuid}@teachers.test"),
            },
        );
        teacher_uuid
    }

    pub fn add_student(&self) -> Uuid {
        let user_uuid = Uuid::new_v4();
        self.users.lock().unwrap().insert(
            user_uuid,
            User {
                user_uuid,
                first_name: "Sam".to_string(),
                last_name: "Student".to_string(),
                email: format!("{user_uuid}@students.test"),
                role: Role::Student,
            },
        );
        self.email_info.lock().unwrap().insert(
            user_uuid,
            UserEmailInfo {
                user_uuid,
                first_name: "Sam".to_string(),
                last_name: "Student".to_string(),
                email: format!("{user_uuid}@students.test"),
            },
        );
        user_uuid
    }

    pub fn clear_email_info(&self) {
        self.email_info.lock().unwrap().clear();
    }
}

#[async_trait]
impl IdentityClient for FakeIdentityClient {
    async fn get_user(&self, user_uuid: Uuid, role: Role) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(&user_uuid)
            .filter(|u| u.role == role)
            .cloned())
    }

    async fn get_teacher(&self, teacher_uuid: Uuid) -> Result<Option<Teacher>, AppError> {
        Ok(self.teachers.lock().unwrap().get(&teacher_uuid).cloned())
    }

    async fn get_teachers(&self, teacher_uuids: &[Uuid]) -> Result<Vec<Teacher>, AppError> {
        let teachers = self.teachers.lock().unwrap();
        Ok(teacher_uuids
            .iter()
            .filter_map(|uuid| teachers.get(uuid).cloned())
            .collect())
    }

    async fn get_users_email_info(
        &self,
        user_uuids: &[Uuid],
    ) -> Result<Vec<UserEmailInfo>, AppError> {
        let info = self.email_info.lock().unwrap();
        Ok(user_uuids
            .iter()
            .filter_map(|uuid| info.get(uuid).cloned())
            .collect())
    }
}

#[derive(Default)]
pub struct FakeQuotaClient {
    quantities: Mutex<HashMap<Uuid, i64>>,
}

impl FakeQuotaClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_quantity(&self, student_uuid: Uuid, total_quantity: i64) {
        self.quantities
            .lock()
            .unwrap()
            .insert(student_uuid, total_quantity);
    }
}

#[async_trait]
impl QuotaClient for FakeQuotaClient {
    async fn get_student_total_quantity(
        &self,
        student_uuid: Uuid,
    ) -> Result<Option<StudentOrdersQuantity>, AppError> {
        Ok(self
            .quantities
            .lock()
            .unwrap()
            .get(&student_uuid)
            .map(|&total_quantity| StudentOrdersQuantity { total_quantity }))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    reminders: Mutex<Vec<ReminderBatch>>,
    cancellations: Mutex<Vec<CancellationRecord>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reminder_batches(&self) -> Vec<ReminderBatch> {
        self.reminders.lock().unwrap().clone()
    }

    pub fn cancellations(&self) -> Vec<CancellationRecord> {
        self.cancellations.lock().unwrap().clone()
    }

    #[allow(unused)]
    pub fn sent_reminders(&self) -> Vec<Reminder> {
        self.reminders
            .lock()
            .unwrap()
            .iter()
            .flat_map(|b| b.reminders.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationClient for RecordingNotifier {
    async fn send_reminders(&self, batch: &ReminderBatch) -> Result<bool, AppError> {
        self.reminders.lock().unwrap().push(batch.clone());
        Ok(true)
    }

    async fn send_cancellation(&self, record: &CancellationRecord) -> Result<bool, AppError> {
        self.cancellations.lock().unwrap().push(record.clone());
        Ok(true)
    }
}
