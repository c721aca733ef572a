//! Ambulance booking models.
//!
//! Bookings carry the caller-supplied patient descriptor, not a patient
//! reference. Emergency intake never waits on a patient lookup.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Requested, not yet acknowledged (store default)
    #[default]
    Pending,
    /// Acknowledged by dispatch
    Confirmed,
    /// Vehicle on the way
    Dispatched,
    /// Trip finished
    Completed,
    /// Called off
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Dispatched,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Dispatched => "dispatched",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// A booking stays active until it is completed or cancelled.
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

/// How the ambulance is dispatched.
///
/// A scheduled trip always carries its slot, so a "scheduled but unslotted"
/// booking cannot be expressed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "dispatch_type")]
pub enum Dispatch {
    /// Send immediately
    #[default]
    Emergency,
    /// Send at the given date and time
    Scheduled { date: NaiveDate, time: NaiveTime },
}

impl Dispatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dispatch::Emergency => "Emergency",
            Dispatch::Scheduled { .. } => "Scheduled",
        }
    }

    pub fn is_emergency(&self) -> bool {
        matches!(self, Dispatch::Emergency)
    }

    pub fn schedule_date(&self) -> Option<NaiveDate> {
        match self {
            Dispatch::Emergency => None,
            Dispatch::Scheduled { date, .. } => Some(*date),
        }
    }

    pub fn schedule_time(&self) -> Option<NaiveTime> {
        match self {
            Dispatch::Emergency => None,
            Dispatch::Scheduled { time, .. } => Some(*time),
        }
    }
}

/// Pickup coordinates. Latitude and longitude are always stored together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// An ambulance booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmbulanceBooking {
    /// Storage key
    pub id: String,
    /// Business identifier (e.g., "AMB-000007")
    pub booking_code: String,
    /// Patient name as given by the caller
    pub patient_name: String,
    pub patient_age: Option<u16>,
    pub patient_gender: Option<String>,
    /// Callback phone (never blank)
    pub phone_number: String,
    /// Vehicle class requested (e.g., "With oxygen", "ICU ambulance")
    pub problem_type: Option<String>,
    /// Emergency or scheduled dispatch
    pub dispatch: Dispatch,
    /// Device location captured at booking time
    pub pickup: Option<GeoPoint>,
    pub pickup_address: Option<String>,
    pub destination_address: Option<String>,
    pub notes: Option<String>,
    /// Driver assigned by dispatch
    pub assigned_driver: Option<String>,
    pub status: BookingStatus,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl AmbulanceBooking {
    /// Pending emergency requests are the ones the desk must act on first.
    pub fn is_pending_emergency(&self) -> bool {
        self.status == BookingStatus::Pending && self.dispatch.is_emergency()
    }
}

/// Fields settable when booking an ambulance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewBooking {
    pub patient_name: String,
    pub patient_age: Option<u16>,
    pub patient_gender: Option<String>,
    pub phone_number: String,
    pub problem_type: Option<String>,
    pub dispatch: Dispatch,
    pub pickup: Option<GeoPoint>,
    pub pickup_address: Option<String>,
    pub destination_address: Option<String>,
    pub notes: Option<String>,
}

impl NewBooking {
    /// Emergency booking with required fields.
    pub fn emergency(patient_name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            patient_name: patient_name.into(),
            phone_number: phone_number.into(),
            ..Default::default()
        }
    }

    /// Scheduled booking with required fields.
    pub fn scheduled(
        patient_name: impl Into<String>,
        phone_number: impl Into<String>,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Self {
        Self {
            dispatch: Dispatch::Scheduled { date, time },
            ..Self::emergency(patient_name, phone_number)
        }
    }
}

/// Partial booking update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BookingUpdate {
    pub patient_name: Option<String>,
    pub patient_age: Option<u16>,
    pub patient_gender: Option<String>,
    pub phone_number: Option<String>,
    pub problem_type: Option<String>,
    pub dispatch: Option<Dispatch>,
    pub pickup: Option<GeoPoint>,
    pub pickup_address: Option<String>,
    pub destination_address: Option<String>,
    pub notes: Option<String>,
    pub assigned_driver: Option<String>,
    pub status: Option<BookingStatus>,
}

impl BookingUpdate {
    pub fn status(status: BookingStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}
