//! List filtering and status presentation.
//!
//! Each list view filters what it has already fetched: a record matches
//! when any of its searchable fields contains the query, ignoring case.

use serde::{Deserialize, Serialize};

use crate::models::{
    AmbulanceBooking, Appointment, AppointmentStatus, BookingStatus, Joined, Patient,
    Prescription,
};

/// A record that can be matched against a free-text query.
pub trait Searchable {
    /// Fields the query is matched against. Absent fields are skipped.
    fn search_fields(&self) -> Vec<&str>;

    /// Whether any field contains `needle`, which must already be lowercase.
    fn matches_lowercase(&self, needle: &str) -> bool {
        self.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

impl Searchable for Patient {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.patient_code.as_str(),
        ];
        fields.extend(self.phone.as_deref());
        fields
    }
}

impl Searchable for AmbulanceBooking {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.booking_code.as_str(),
            self.patient_name.as_str(),
            self.phone_number.as_str(),
        ]
    }
}

impl Searchable for Joined<Appointment> {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.appointment_code.as_str()];
        fields.extend(self.department.as_deref());
        if let Some(patient) = &self.patient {
            fields.push(&patient.first_name);
            fields.push(&patient.last_name);
        }
        fields
    }
}

impl Searchable for Joined<Prescription> {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.prescription_code.as_str()];
        fields.extend(self.diagnosis.as_deref());
        if let Some(patient) = &self.patient {
            fields.push(&patient.first_name);
            fields.push(&patient.last_name);
        }
        fields
    }
}

/// Items matching `query`, in their original order. A blank query matches
/// everything.
pub fn filter<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| item.matches_lowercase(&needle))
        .collect()
}

/// Visual classification of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
    Accent,
}

impl BookingStatus {
    pub fn tone(&self) -> StatusTone {
        match self {
            BookingStatus::Pending => StatusTone::Warning,
            BookingStatus::Confirmed => StatusTone::Info,
            BookingStatus::Dispatched => StatusTone::Accent,
            BookingStatus::Completed => StatusTone::Success,
            BookingStatus::Cancelled => StatusTone::Danger,
        }
    }
}

impl AppointmentStatus {
    pub fn tone(&self) -> StatusTone {
        match self {
            AppointmentStatus::Scheduled => StatusTone::Info,
            AppointmentStatus::Confirmed => StatusTone::Success,
            AppointmentStatus::Completed => StatusTone::Neutral,
            AppointmentStatus::Cancelled => StatusTone::Danger,
            AppointmentStatus::NoShow => StatusTone::Warning,
        }
    }
}
