//! Read-time join shapes.

use serde::{Deserialize, Serialize};

/// Label shown when a record's patient no longer exists.
pub const UNKNOWN_PATIENT: &str = "Unknown Patient";

/// Patient display fields attached to another record at read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientSummary {
    pub first_name: String,
    pub last_name: String,
    pub patient_code: String,
    /// Only populated by the contact expansion
    pub phone: Option<String>,
}

/// A record together with a snapshot of its referenced patient.
///
/// `patient` is `None` when the patient has been deleted; that is an
/// expected state, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Joined<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(rename = "patients")]
    pub patient: Option<PatientSummary>,
}

impl<T> Joined<T> {
    pub fn new(record: T, patient: Option<PatientSummary>) -> Self {
        Self { record, patient }
    }

    /// "First Last", or [`UNKNOWN_PATIENT`] when the patient is gone.
    pub fn patient_display_name(&self) -> String {
        match &self.patient {
            Some(p) => format!("{} {}", p.first_name, p.last_name),
            None => UNKNOWN_PATIENT.to_string(),
        }
    }

    pub fn into_record(self) -> T {
        self.record
    }
}

impl<T> std::ops::Deref for Joined<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphan_display_name() {
        let joined = Joined::new("rx", None);
        assert_eq!(joined.patient_display_name(), "Unknown Patient");
    }

    #[test]
    fn test_display_name_with_patient() {
        let joined = Joined::new(
            (),
            Some(PatientSummary {
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                patient_code: "PAT-000001".into(),
                phone: None,
            }),
        );
        assert_eq!(joined.patient_display_name(), "Jane Doe");
    }
}
