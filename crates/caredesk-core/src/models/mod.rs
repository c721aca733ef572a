//! Domain models for CareDesk.

mod ambulance;
mod appointment;
mod joined;
mod patient;
mod prescription;

pub use ambulance::*;
pub use appointment::*;
pub use joined::*;
pub use patient::*;
pub use prescription::*;
