//! Prescription models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single medication line on a prescription. All fields are free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Medication {
    /// Drug name (e.g., "Amoxicillin 500mg")
    pub name: String,
    /// Amount per dose (e.g., "1 tablet")
    pub dosage: String,
    /// How often (e.g., "twice daily")
    pub frequency: String,
    /// For how long (e.g., "5 days")
    pub duration: String,
}

impl Medication {
    pub fn new(
        name: impl Into<String>,
        dosage: impl Into<String>,
        frequency: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dosage: dosage.into(),
            frequency: frequency.into(),
            duration: duration.into(),
        }
    }

    /// "dosage • frequency • duration", skipping blank parts.
    pub fn directions(&self) -> String {
        [&self.dosage, &self.frequency, &self.duration]
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" • ")
    }
}

/// A prescription issued to a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// Storage key
    pub id: String,
    /// Business identifier (e.g., "RX-000011")
    pub prescription_code: String,
    /// Patient storage key. Cleared when the patient is deleted.
    pub patient_id: Option<String>,
    /// Prescribing principal
    pub doctor_id: Option<String>,
    pub diagnosis: Option<String>,
    pub symptoms: Option<String>,
    /// Medication lines, in the order they were written
    pub medications: Vec<Medication>,
    /// Free-text instructions for the patient
    pub instructions: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields settable when writing a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPrescription {
    pub patient_id: String,
    pub diagnosis: Option<String>,
    pub symptoms: Option<String>,
    pub medications: Vec<Medication>,
    pub instructions: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
}

impl NewPrescription {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            diagnosis: None,
            symptoms: None,
            medications: Vec::new(),
            instructions: None,
            follow_up_date: None,
        }
    }
}

/// Partial prescription update. `None` leaves the stored value untouched;
/// `Some(medications)` replaces the whole list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PrescriptionUpdate {
    pub patient_id: Option<String>,
    pub diagnosis: Option<String>,
    pub symptoms: Option<String>,
    pub medications: Option<Vec<Medication>>,
    pub instructions: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
}
