//! Patient models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::joined::PatientSummary;

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Storage key - opaque, assigned at creation
    pub id: String,
    /// Business identifier (e.g., "PAT-000042"), issued by the store
    pub patient_code: String,
    /// Given name (never blank)
    pub first_name: String,
    /// Family name (never blank)
    pub last_name: String,
    /// Date of birth
    pub date_of_birth: Option<NaiveDate>,
    /// Gender as entered at the desk
    pub gender: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Street address
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    /// Blood group (e.g., "O+")
    pub blood_group: Option<String>,
    /// Known allergies, free text
    pub allergies: Option<String>,
    /// Past conditions and procedures, free text
    pub medical_history: Option<String>,
    /// Medications the patient is currently taking, free text
    pub current_medications: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    /// Link to an uploaded photo
    pub photo_url: Option<String>,
    /// Principal who registered the patient (absent when created signed out)
    pub created_by: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// "First Last" display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Display fields used when another record joins this patient.
    pub fn summary(&self) -> PatientSummary {
        PatientSummary {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            patient_code: self.patient_code.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Fields settable when registering a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub photo_url: Option<String>,
}

impl NewPatient {
    /// Create a registration with required fields.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }
}

/// Partial patient update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub photo_url: Option<String>,
}
