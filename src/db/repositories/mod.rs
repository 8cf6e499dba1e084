mod appointment_repository;
mod availability_repository;

pub use appointment_repository::{AppointmentRepository, PgAppointmentRepository};
pub use availability_repository::{AvailabilityRepository, PgAvailabilityRepository};
