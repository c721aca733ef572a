//! Appointment database operations.
//!
//! Reads always join the referenced patient's display fields (with phone).

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::assign::Assignments;
use super::expand::PatientExpansion;
use super::{new_storage_key, Database, DbError, DbResult};
use crate::auth::PrincipalId;
use crate::models::{
    Appointment, AppointmentStatus, AppointmentUpdate, Joined, NewAppointment, PatientSummary,
};

const APPOINTMENT_COLUMNS: &str = r#"
    a.id, a.appointment_code, a.patient_id, a.doctor_id, a.appointment_date,
    a.appointment_time, a.department, a.reason, a.notes, a.status,
    a.created_by, a.created_at, a.updated_at
"#;

const APPOINTMENT_WIDTH: usize = 13;

const EXPANSION: PatientExpansion = PatientExpansion::WithContact;

impl Database {
    /// Schedule an appointment. The patient must exist.
    pub fn create_appointment(
        &self,
        actor: Option<&PrincipalId>,
        appointment: &NewAppointment,
    ) -> DbResult<Appointment> {
        let id = new_storage_key();
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, patient_id, doctor_id, appointment_date, appointment_time,
                department, reason, notes, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                id,
                appointment.patient_id,
                appointment.doctor_id,
                appointment.appointment_date,
                appointment.appointment_time,
                appointment.department,
                appointment.reason,
                appointment.notes,
                actor.map(PrincipalId::as_str),
            ],
        )?;

        self.get_appointment(&id)?
            .map(Joined::into_record)
            .ok_or_else(|| DbError::NotFound(format!("appointment {id}")))
    }

    /// Get an appointment with its patient's display fields.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Joined<Appointment>>> {
        self.conn
            .query_row(
                &joined_select("WHERE a.id = ?1", ""),
                [id],
                AppointmentRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all appointments by date and time, earliest first.
    pub fn list_appointments(&self) -> DbResult<Vec<Joined<Appointment>>> {
        self.query_appointments(
            &joined_select("", "ORDER BY a.appointment_date ASC, a.appointment_time ASC"),
            &[],
        )
    }

    /// List appointments on `date`, earliest first.
    pub fn list_appointments_on(&self, date: NaiveDate) -> DbResult<Vec<Joined<Appointment>>> {
        self.query_appointments(
            &joined_select("WHERE a.appointment_date = ?1", "ORDER BY a.appointment_time ASC"),
            &[&date],
        )
    }

    /// List a patient's appointments by date and time.
    pub fn list_appointments_for_patient(
        &self,
        patient_id: &str,
    ) -> DbResult<Vec<Joined<Appointment>>> {
        self.query_appointments(
            &joined_select(
                "WHERE a.patient_id = ?1",
                "ORDER BY a.appointment_date ASC, a.appointment_time ASC",
            ),
            &[&patient_id],
        )
    }

    fn query_appointments(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> DbResult<Vec<Joined<Appointment>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, AppointmentRow::from_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }

    /// Apply a partial update. Fails with `NotFound` when no such appointment exists.
    pub fn update_appointment(&self, id: &str, update: &AppointmentUpdate) -> DbResult<Appointment> {
        let mut assignments = Assignments::new();
        assignments
            .maybe("patient_id", update.patient_id.clone())
            .maybe("doctor_id", update.doctor_id.clone())
            .maybe("appointment_date", update.appointment_date)
            .maybe("appointment_time", update.appointment_time)
            .maybe("department", update.department.clone())
            .maybe("reason", update.reason.clone())
            .maybe("notes", update.notes.clone())
            .maybe("status", update.status.map(|s| s.as_str()));

        if !assignments.is_empty() {
            assignments.apply(self, "appointments", id)?;
        }

        self.get_appointment(id)?
            .map(Joined::into_record)
            .ok_or_else(|| DbError::NotFound(format!("appointment {id}")))
    }

    /// Set only the status of an appointment.
    pub fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> DbResult<Appointment> {
        self.update_appointment(id, &AppointmentUpdate::status(status))
    }

    /// Delete an appointment. Returns whether a row was removed.
    pub fn delete_appointment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn joined_select(filter: &str, order: &str) -> String {
    format!(
        "SELECT {APPOINTMENT_COLUMNS}, {} FROM appointments a LEFT JOIN patients p ON p.id = a.patient_id {filter} {order}",
        PatientExpansion::COLUMNS
    )
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: String,
    appointment_code: String,
    patient_id: Option<String>,
    doctor_id: Option<String>,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    department: Option<String>,
    reason: Option<String>,
    notes: Option<String>,
    status: String,
    created_by: Option<String>,
    created_at: String,
    updated_at: String,
    patient: Option<PatientSummary>,
}

impl AppointmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            appointment_code: row.get(1)?,
            patient_id: row.get(2)?,
            doctor_id: row.get(3)?,
            appointment_date: row.get(4)?,
            appointment_time: row.get(5)?,
            department: row.get(6)?,
            reason: row.get(7)?,
            notes: row.get(8)?,
            status: row.get(9)?,
            created_by: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
            patient: EXPANSION.read(row, APPOINTMENT_WIDTH)?,
        })
    }
}

impl TryFrom<AppointmentRow> for Joined<Appointment> {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = AppointmentStatus::parse(&row.status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown appointment status: {}", row.status))
        })?;

        let appointment = Appointment {
            id: row.id,
            appointment_code: row.appointment_code,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            appointment_date: row.appointment_date,
            appointment_time: row.appointment_time,
            department: row.department,
            reason: row.reason,
            notes: row.notes,
            status,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Ok(Joined::new(appointment, row.patient))
    }
}
