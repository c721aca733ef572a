//! Prescription database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::assign::Assignments;
use super::expand::PatientExpansion;
use super::{new_storage_key, Database, DbError, DbResult};
use crate::auth::PrincipalId;
use crate::models::{
    Joined, Medication, NewPrescription, PatientSummary, Prescription, PrescriptionUpdate,
};

const PRESCRIPTION_COLUMNS: &str = r#"
    rx.id, rx.prescription_code, rx.patient_id, rx.doctor_id, rx.diagnosis,
    rx.symptoms, rx.medications, rx.instructions, rx.follow_up_date,
    rx.created_by, rx.created_at, rx.updated_at
"#;

const PRESCRIPTION_WIDTH: usize = 12;

const EXPANSION: PatientExpansion = PatientExpansion::Basic;

impl Database {
    /// Write a prescription. The creating principal is recorded as both
    /// prescriber and creator.
    pub fn create_prescription(
        &self,
        actor: Option<&PrincipalId>,
        prescription: &NewPrescription,
    ) -> DbResult<Prescription> {
        let id = new_storage_key();
        let medications_json = serde_json::to_string(&prescription.medications)?;
        let actor = actor.map(PrincipalId::as_str);

        self.conn.execute(
            r#"
            INSERT INTO prescriptions (
                id, patient_id, doctor_id, diagnosis, symptoms, medications,
                instructions, follow_up_date, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                id,
                prescription.patient_id,
                actor,
                prescription.diagnosis,
                prescription.symptoms,
                medications_json,
                prescription.instructions,
                prescription.follow_up_date,
                actor,
            ],
        )?;

        self.get_prescription(&id)?
            .map(Joined::into_record)
            .ok_or_else(|| DbError::NotFound(format!("prescription {id}")))
    }

    /// Get a prescription with its patient's display fields.
    pub fn get_prescription(&self, id: &str) -> DbResult<Option<Joined<Prescription>>> {
        self.conn
            .query_row(
                &joined_select("WHERE rx.id = ?1"),
                [id],
                PrescriptionRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all prescriptions, newest first.
    pub fn list_prescriptions(&self) -> DbResult<Vec<Joined<Prescription>>> {
        self.query_prescriptions(&joined_select(""), &[])
    }

    /// List a patient's prescriptions, newest first.
    pub fn list_prescriptions_for_patient(
        &self,
        patient_id: &str,
    ) -> DbResult<Vec<Joined<Prescription>>> {
        self.query_prescriptions(&joined_select("WHERE rx.patient_id = ?1"), &[&patient_id])
    }

    fn query_prescriptions(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> DbResult<Vec<Joined<Prescription>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, PrescriptionRow::from_row)?;

        let mut prescriptions = Vec::new();
        for row in rows {
            prescriptions.push(row?.try_into()?);
        }
        Ok(prescriptions)
    }

    /// Apply a partial update. Fails with `NotFound` when no such prescription exists.
    pub fn update_prescription(
        &self,
        id: &str,
        update: &PrescriptionUpdate,
    ) -> DbResult<Prescription> {
        let medications_json = update
            .medications
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut assignments = Assignments::new();
        assignments
            .maybe("patient_id", update.patient_id.clone())
            .maybe("diagnosis", update.diagnosis.clone())
            .maybe("symptoms", update.symptoms.clone())
            .maybe("medications", medications_json)
            .maybe("instructions", update.instructions.clone())
            .maybe("follow_up_date", update.follow_up_date);

        if !assignments.is_empty() {
            assignments.apply(self, "prescriptions", id)?;
        }

        self.get_prescription(id)?
            .map(Joined::into_record)
            .ok_or_else(|| DbError::NotFound(format!("prescription {id}")))
    }

    /// Delete a prescription. Returns whether a row was removed.
    pub fn delete_prescription(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM prescriptions WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn joined_select(filter: &str) -> String {
    format!(
        "SELECT {PRESCRIPTION_COLUMNS}, {} FROM prescriptions rx LEFT JOIN patients p ON p.id = rx.patient_id {filter} ORDER BY rx.created_at DESC, rx.rowid DESC",
        PatientExpansion::COLUMNS
    )
}

/// Intermediate row struct for database mapping.
struct PrescriptionRow {
    id: String,
    prescription_code: String,
    patient_id: Option<String>,
    doctor_id: Option<String>,
    diagnosis: Option<String>,
    symptoms: Option<String>,
    medications: String,
    instructions: Option<String>,
    follow_up_date: Option<NaiveDate>,
    created_by: Option<String>,
    created_at: String,
    updated_at: String,
    patient: Option<PatientSummary>,
}

impl PrescriptionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            prescription_code: row.get(1)?,
            patient_id: row.get(2)?,
            doctor_id: row.get(3)?,
            diagnosis: row.get(4)?,
            symptoms: row.get(5)?,
            medications: row.get(6)?,
            instructions: row.get(7)?,
            follow_up_date: row.get(8)?,
            created_by: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
            patient: EXPANSION.read(row, PRESCRIPTION_WIDTH)?,
        })
    }
}

impl TryFrom<PrescriptionRow> for Joined<Prescription> {
    type Error = DbError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        let medications: Vec<Medication> = serde_json::from_str(&row.medications)?;

        let prescription = Prescription {
            id: row.id,
            prescription_code: row.prescription_code,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            diagnosis: row.diagnosis,
            symptoms: row.symptoms,
            medications,
            instructions: row.instructions,
            follow_up_date: row.follow_up_date,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Ok(Joined::new(prescription, row.patient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPatient;

    fn setup_db() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let mut patient = NewPatient::new("Jane", "Doe");
        patient.phone = Some("555-0142".into());
        let patient = db.create_patient(None, &patient).unwrap();
        (db, patient.id)
    }

    fn amoxicillin() -> Medication {
        Medication::new("Amoxicillin 500mg", "1 capsule", "three times daily", "7 days")
    }

    #[test]
    fn test_create_stamps_prescriber() {
        let (db, patient_id) = setup_db();
        let doctor = PrincipalId::new("dr-rao");

        let mut new = NewPrescription::new(&patient_id);
        new.diagnosis = Some("Tonsillitis".into());
        new.medications = vec![amoxicillin(), Medication::new("Paracetamol", "500mg", "SOS", "")];

        let created = db.create_prescription(Some(&doctor), &new).unwrap();
        assert_eq!(created.prescription_code, "RX-000001");
        assert_eq!(created.doctor_id.as_deref(), Some("dr-rao"));
        assert_eq!(created.created_by.as_deref(), Some("dr-rao"));
        assert_eq!(created.medications.len(), 2);
        assert_eq!(created.medications[0], amoxicillin());
    }

    #[test]
    fn test_basic_join_omits_phone() {
        let (db, patient_id) = setup_db();
        let created = db
            .create_prescription(None, &NewPrescription::new(&patient_id))
            .unwrap();

        let joined = db.get_prescription(&created.id).unwrap().unwrap();
        let patient = joined.patient.as_ref().unwrap();
        assert_eq!(patient.last_name, "Doe");
        assert_eq!(patient.phone, None);
        assert!(joined.medications.is_empty());
    }

    #[test]
    fn test_replace_medications() {
        let (db, patient_id) = setup_db();
        let created = db
            .create_prescription(None, &NewPrescription::new(&patient_id))
            .unwrap();

        let update = PrescriptionUpdate {
            medications: Some(vec![amoxicillin()]),
            follow_up_date: NaiveDate::from_ymd_opt(2026, 10, 23),
            ..Default::default()
        };
        let updated = db.update_prescription(&created.id, &update).unwrap();
        assert_eq!(updated.medications, vec![amoxicillin()]);
        assert_eq!(updated.follow_up_date, NaiveDate::from_ymd_opt(2026, 10, 23));
    }

    #[test]
    fn test_orphaned_after_patient_delete() {
        let (db, patient_id) = setup_db();
        db.create_prescription(None, &NewPrescription::new(&patient_id))
            .unwrap();
        db.delete_patient(&patient_id).unwrap();

        let all = db.list_prescriptions().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].patient.is_none());
        assert!(all[0].patient_id.is_none());
    }

    #[test]
    fn test_for_patient_newest_first() {
        let (db, patient_id) = setup_db();
        let first = db
            .create_prescription(None, &NewPrescription::new(&patient_id))
            .unwrap();
        let second = db
            .create_prescription(None, &NewPrescription::new(&patient_id))
            .unwrap();

        let list = db.list_prescriptions_for_patient(&patient_id).unwrap();
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[1].id, first.id);
    }
}
