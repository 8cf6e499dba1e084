use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::{
    CancellationRecord, IdentityClient, NotificationClient, QuotaClient, Reminder, ReminderBatch,
};
use crate::auth::Role;
use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::db::models::{Appointment, NewAppointment};
use crate::db::repositories::{AppointmentRepository, AvailabilityRepository};
use crate::db::DatabaseError;
use crate::error::{AppError, AppResult};

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_MINUTE: i64 = 60;

// Constraint names from the scheduler migration; the insert backstop maps
// them back to guard-chain error identities under concurrent bookings.
const STUDENT_START_CONSTRAINT: &str = "appointment_student_start_key";

pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
    availabilities: Arc<dyn AvailabilityRepository>,
    identity: Arc<dyn IdentityClient>,
    quota: Arc<dyn QuotaClient>,
    notifier: Arc<dyn NotificationClient>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl AppointmentService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        availabilities: Arc<dyn AvailabilityRepository>,
        identity: Arc<dyn IdentityClient>,
        quota: Arc<dyn QuotaClient>,
        notifier: Arc<dyn NotificationClient>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            appointments,
            availabilities,
            identity,
            quota,
            notifier,
            clock,
            config,
        }
    }

    /// The booking guard chain. The guards run strictly in this order and
    /// each one short-circuits with its own error identity; steps 1-6 read
    /// only, the single write happens last.
    pub async fn create_appointment(
        &self,
        student_uuid: Uuid,
        teacher_uuid: Uuid,
        availability_uuid: Uuid,
    ) -> AppResult<Uuid> {
        // 1. The target slot must exist, belong to the teacher and be open.
        let open = self
            .availabilities
            .find_open_by_ids(&[availability_uuid], teacher_uuid)
            .await?;
        let Some(availability) = open.into_iter().next() else {
            return Err(AppError::AvailabilityNotFound);
        };

        // 2. Booking lead time.
        let add_window = self.clock.now_unix() - self.config.hours_to_add * SECONDS_PER_HOUR;
        if availability.start_date < add_window {
            return Err(AppError::IncorrectAddDate(self.config.hours_to_add));
        }

        // 3. The caller must resolve to a student.
        let student = self
            .identity
            .get_user(student_uuid, Role::Student)
            .await?
            .ok_or(AppError::StudentNotFound)?;

        // 4. The student must have an order on file.
        let total = self
            .quota
            .get_student_total_quantity(student.user_uuid)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        // 5. Quota is checked against consumption to date, not against the
        // booking being created: total < used rejects, total == used passes.
        let used = self
            .appointments
            .count_finished_for_student(student.user_uuid)
            .await?;
        if total.total_quantity < used {
            return Err(AppError::NoAppointmentsLeft);
        }

        // 6. One booking per student per start date.
        if self
            .appointments
            .exists_for_student_at(student.user_uuid, availability.start_date)
            .await?
        {
            return Err(AppError::StudentHasAppointment);
        }

        // 7. Create. Unique violations mean a concurrent booking won the
        // race between the reads above and this insert.
        let new = NewAppointment {
            student_uuid: student.user_uuid,
            teacher_uuid,
            availability_uuid,
            start_date: availability.start_date,
            end_date: availability.end_date,
        };

        match self.appointments.insert(&new).await {
            Ok(appointment_uuid) => {
                info!(
                    appointment = %appointment_uuid,
                    student = %student.user_uuid,
                    teacher = %teacher_uuid,
                    "appointment created"
                );
                Ok(appointment_uuid)
            }
            Err(DatabaseError::Duplicate(constraint)) => {
                if constraint == STUDENT_START_CONSTRAINT {
                    Err(AppError::StudentHasAppointment)
                } else {
                    Err(AppError::AvailabilityNotFound)
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_appointments(
        &self,
        user_uuid: Uuid,
        start_date: i64,
        end_date: i64,
    ) -> AppResult<Vec<Appointment>> {
        Ok(self
            .appointments
            .find_for_user_in_range(user_uuid, start_date, end_date)
            .await?)
    }

    /// Student-initiated removal: deletes only the appointment row, so the
    /// availability becomes open and rebookable. Ownership mismatches are
    /// reported as not-found.
    pub async fn remove_appointment(
        &self,
        appointment_uuid: Uuid,
        student_uuid: Uuid,
    ) -> AppResult<()> {
        let appointment = self
            .appointments
            .find_by_id(appointment_uuid)
            .await?
            .ok_or(AppError::AppointmentNotFound)?;

        if appointment.student_uuid != student_uuid {
            return Err(AppError::AppointmentNotFound);
        }

        let remove_window =
            self.clock.now_unix() - self.config.hours_to_remove * SECONDS_PER_HOUR;
        if appointment.start_date < remove_window {
            return Err(AppError::IncorrectRemoveDate(self.config.hours_to_remove));
        }

        self.appointments.delete(appointment.appointment_uuid).await?;
        info!(appointment = %appointment_uuid, "appointment removed by student");

        Ok(())
    }

    /// Teacher-initiated cancellation: the teacher is retracting the time,
    /// so both the appointment and its availability are deleted in one
    /// transaction. Returns the freed availability id.
    pub async fn cancel_appointment(
        &self,
        appointment_uuid: Uuid,
        teacher_uuid: Uuid,
        message: &str,
    ) -> AppResult<Uuid> {
        let appointment = self
            .appointments
            .find_by_id(appointment_uuid)
            .await?
            .ok_or(AppError::AppointmentNotFound)?;

        if appointment.teacher_uuid != teacher_uuid {
            return Err(AppError::AppointmentNotFound);
        }

        self.appointments
            .delete_with_availability(appointment.appointment_uuid, appointment.availability_uuid)
            .await?;
        info!(appointment = %appointment_uuid, "appointment cancelled by teacher");

        let record = CancellationRecord {
            appointment_uuid: appointment.appointment_uuid,
            student_uuid: appointment.student_uuid,
            teacher_uuid: appointment.teacher_uuid,
            start_date: appointment.start_date,
            message: message.to_string(),
        };
        if let Err(err) = self.notifier.send_cancellation(&record).await {
            warn!(appointment = %appointment_uuid, error = %err, "cancellation notification failed");
        }

        Ok(appointment.availability_uuid)
    }

    /// Selects appointments starting inside the reminder window, joins both
    /// parties' contact info and submits one batch. A tick with an empty
    /// identity batch is a no-op. Returns the number of reminders sent.
    pub async fn run_reminder_sweep(&self) -> AppResult<usize> {
        let now = self.clock.now_unix();
        let window_end = now + self.config.reminder_window_min * SECONDS_PER_MINUTE;

        let upcoming = self.appointments.find_starting_between(now, window_end).await?;
        if upcoming.is_empty() {
            return Ok(0);
        }

        let teacher_uuids: Vec<Uuid> = upcoming.iter().map(|a| a.teacher_uuid).collect();
        let student_uuids: Vec<Uuid> = upcoming.iter().map(|a| a.student_uuid).collect();

        let teachers = self.identity.get_users_email_info(&teacher_uuids).await?;
        let students = self.identity.get_users_email_info(&student_uuids).await?;

        if teachers.is_empty() || students.is_empty() {
            return Ok(0);
        }

        let teachers_by_uuid: HashMap<Uuid, _> =
            teachers.into_iter().map(|t| (t.user_uuid, t)).collect();
        let students_by_uuid: HashMap<Uuid, _> =
            students.into_iter().map(|s| (s.user_uuid, s)).collect();

        let reminders: Vec<Reminder> = upcoming
            .iter()
            .filter_map(|appointment| {
                let teacher = teachers_by_uuid.get(&appointment.teacher_uuid)?;
                let student = students_by_uuid.get(&appointment.student_uuid)?;

                Some(Reminder {
                    student_uuid: appointment.student_uuid,
                    teacher_uuid: appointment.teacher_uuid,
                    start_date: appointment.start_date,
                    teacher_first_name: teacher.first_name.clone(),
                    teacher_last_name: teacher.last_name.clone(),
                    teacher_email: teacher.email.clone(),
                    student_first_name: student.first_name.clone(),
                    student_last_name: student.last_name.clone(),
                    student_email: student.email.clone(),
                })
            })
            .collect();

        if reminders.is_empty() {
            return Ok(0);
        }

        let sent = reminders.len();
        self.notifier
            .send_reminders(&ReminderBatch { reminders })
            .await?;
        info!(count = sent, "appointment reminders sent");

        Ok(sent)
    }

    /// Promotes every Scheduled appointment whose end date has passed to
    /// Finished. Sole writer of the Finished status.
    pub async fn run_finished_sweep(&self) -> AppResult<u64> {
        let now = self.clock.now_unix();
        let finished = self.appointments.find_scheduled_ended_before(now).await?;

        if finished.is_empty() {
            return Ok(0);
        }

        let updated = self.appointments.mark_finished(&finished).await?;
        info!(count = updated, "appointments promoted to finished");

        Ok(updated)
    }
}
