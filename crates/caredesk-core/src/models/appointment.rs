//! Appointment models.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Appointment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    /// Booked (store default)
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    /// Patient did not turn up
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

/// A scheduled visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Storage key
    pub id: String,
    /// Business identifier (e.g., "APT-000003")
    pub appointment_code: String,
    /// Patient storage key. Cleared when the patient is deleted.
    pub patient_id: Option<String>,
    /// Attending doctor, if assigned
    pub doctor_id: Option<String>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub department: Option<String>,
    /// Reason for the visit
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields settable when scheduling an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    /// Must reference an existing patient; the store rejects anything else.
    pub patient_id: String,
    pub doctor_id: Option<String>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub department: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn new(patient_id: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            patient_id: patient_id.into(),
            doctor_id: None,
            appointment_date: date,
            appointment_time: time,
            department: None,
            reason: None,
            notes: None,
        }
    }
}

/// Partial appointment update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppointmentUpdate {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<NaiveTime>,
    pub department: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentUpdate {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}
