mod appointment;
mod availability;

pub use appointment::*;
pub use availability::*;
