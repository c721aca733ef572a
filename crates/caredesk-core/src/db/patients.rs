//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::assign::Assignments;
use super::{new_storage_key, Database, DbError, DbResult};
use crate::auth::PrincipalId;
use crate::models::{NewPatient, Patient, PatientUpdate};

const PATIENT_COLUMNS: &str = r#"
    id, patient_code, first_name, last_name, date_of_birth, gender,
    phone, email, address, city, state, pincode, blood_group, allergies,
    medical_history, current_medications, emergency_contact_name,
    emergency_contact_phone, photo_url, created_by, created_at, updated_at
"#;

fn map_patient(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        patient_code: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        date_of_birth: row.get(4)?,
        gender: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        address: row.get(8)?,
        city: row.get(9)?,
        state: row.get(10)?,
        pincode: row.get(11)?,
        blood_group: row.get(12)?,
        allergies: row.get(13)?,
        medical_history: row.get(14)?,
        current_medications: row.get(15)?,
        emergency_contact_name: row.get(16)?,
        emergency_contact_phone: row.get(17)?,
        photo_url: row.get(18)?,
        created_by: row.get(19)?,
        created_at: row.get(20)?,
        updated_at: row.get(21)?,
    })
}

impl Database {
    /// Register a new patient and return the stored row, including the
    /// store-issued business identifier.
    pub fn create_patient(
        &self,
        actor: Option<&PrincipalId>,
        patient: &NewPatient,
    ) -> DbResult<Patient> {
        let id = new_storage_key();
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, first_name, last_name, date_of_birth, gender, phone, email,
                address, city, state, pincode, blood_group, allergies,
                medical_history, current_medications, emergency_contact_name,
                emergency_contact_phone, photo_url, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                id,
                patient.first_name,
                patient.last_name,
                patient.date_of_birth,
                patient.gender,
                patient.phone,
                patient.email,
                patient.address,
                patient.city,
                patient.state,
                patient.pincode,
                patient.blood_group,
                patient.allergies,
                patient.medical_history,
                patient.current_medications,
                patient.emergency_contact_name,
                patient.emergency_contact_phone,
                patient.photo_url,
                actor.map(PrincipalId::as_str),
            ],
        )?;

        self.get_patient(&id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {id}")))
    }

    /// Get a patient by storage key.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"),
                [id],
                map_patient,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients, newest registration first.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map([], map_patient)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Apply a partial update. Fails with `NotFound` when no such patient exists.
    pub fn update_patient(&self, id: &str, update: &PatientUpdate) -> DbResult<Patient> {
        let mut assignments = Assignments::new();
        assignments
            .maybe("first_name", update.first_name.clone())
            .maybe("last_name", update.last_name.clone())
            .maybe("date_of_birth", update.date_of_birth)
            .maybe("gender", update.gender.clone())
            .maybe("phone", update.phone.clone())
            .maybe("email", update.email.clone())
            .maybe("address", update.address.clone())
            .maybe("city", update.city.clone())
            .maybe("state", update.state.clone())
            .maybe("pincode", update.pincode.clone())
            .maybe("blood_group", update.blood_group.clone())
            .maybe("allergies", update.allergies.clone())
            .maybe("medical_history", update.medical_history.clone())
            .maybe("current_medications", update.current_medications.clone())
            .maybe("emergency_contact_name", update.emergency_contact_name.clone())
            .maybe("emergency_contact_phone", update.emergency_contact_phone.clone())
            .maybe("photo_url", update.photo_url.clone());

        if !assignments.is_empty() {
            assignments.apply(self, "patients", id)?;
        }

        self.get_patient(id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {id}")))
    }

    /// Delete a patient. Returns whether a row was removed; deleting an
    /// absent key is not an error.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
