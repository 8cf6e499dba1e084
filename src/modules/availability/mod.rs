pub mod handlers;
pub mod routes;
pub mod service;
pub mod slots;

pub use service::{AvailabilityDetail, AvailabilityService};
