//! Ambulance booking database operations.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, OptionalExtension, Row};

use super::assign::Assignments;
use super::{new_storage_key, Database, DbError, DbResult};
use crate::auth::PrincipalId;
use crate::models::{AmbulanceBooking, BookingStatus, BookingUpdate, Dispatch, GeoPoint, NewBooking};

const BOOKING_COLUMNS: &str = r#"
    id, booking_code, patient_name, patient_age, patient_gender, phone_number,
    problem_type, dispatch_type, schedule_date, schedule_time, pickup_latitude,
    pickup_longitude, pickup_address, destination_address, notes,
    assigned_driver, status, created_by, created_at, updated_at
"#;

impl Database {
    /// Book an ambulance and return the stored row.
    pub fn create_booking(
        &self,
        actor: Option<&PrincipalId>,
        booking: &NewBooking,
    ) -> DbResult<AmbulanceBooking> {
        let id = new_storage_key();
        self.conn.execute(
            r#"
            INSERT INTO ambulance_bookings (
                id, patient_name, patient_age, patient_gender, phone_number,
                problem_type, dispatch_type, schedule_date, schedule_time,
                pickup_latitude, pickup_longitude, pickup_address,
                destination_address, notes, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                id,
                booking.patient_name,
                booking.patient_age,
                booking.patient_gender,
                booking.phone_number,
                booking.problem_type,
                booking.dispatch.as_str(),
                booking.dispatch.schedule_date(),
                booking.dispatch.schedule_time(),
                booking.pickup.map(|p| p.latitude),
                booking.pickup.map(|p| p.longitude),
                booking.pickup_address,
                booking.destination_address,
                booking.notes,
                actor.map(PrincipalId::as_str),
            ],
        )?;

        self.get_booking(&id)?
            .ok_or_else(|| DbError::NotFound(format!("ambulance booking {id}")))
    }

    /// Get a booking by storage key.
    pub fn get_booking(&self, id: &str) -> DbResult<Option<AmbulanceBooking>> {
        self.conn
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM ambulance_bookings WHERE id = ?"),
                [id],
                BookingRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all bookings, newest first.
    pub fn list_bookings(&self) -> DbResult<Vec<AmbulanceBooking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM ambulance_bookings ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map([], BookingRow::from_row)?;

        let mut bookings = Vec::new();
        for row in rows {
            bookings.push(row?.try_into()?);
        }
        Ok(bookings)
    }

    /// Apply a partial update. Fails with `NotFound` when no such booking exists.
    pub fn update_booking(&self, id: &str, update: &BookingUpdate) -> DbResult<AmbulanceBooking> {
        let mut assignments = Assignments::new();
        assignments
            .maybe("patient_name", update.patient_name.clone())
            .maybe("patient_age", update.patient_age)
            .maybe("patient_gender", update.patient_gender.clone())
            .maybe("phone_number", update.phone_number.clone())
            .maybe("problem_type", update.problem_type.clone())
            .maybe("pickup_address", update.pickup_address.clone())
            .maybe("destination_address", update.destination_address.clone())
            .maybe("notes", update.notes.clone())
            .maybe("assigned_driver", update.assigned_driver.clone())
            .maybe("status", update.status.map(|s| s.as_str()));

        // Dispatch and pickup span several columns that must change together
        if let Some(dispatch) = update.dispatch {
            assignments
                .set("dispatch_type", dispatch.as_str())
                .set("schedule_date", dispatch.schedule_date())
                .set("schedule_time", dispatch.schedule_time());
        }
        if let Some(pickup) = update.pickup {
            assignments
                .set("pickup_latitude", pickup.latitude)
                .set("pickup_longitude", pickup.longitude);
        }

        if !assignments.is_empty() {
            assignments.apply(self, "ambulance_bookings", id)?;
        }

        self.get_booking(id)?
            .ok_or_else(|| DbError::NotFound(format!("ambulance booking {id}")))
    }

    /// Set only the status of a booking.
    pub fn update_booking_status(&self, id: &str, status: BookingStatus) -> DbResult<AmbulanceBooking> {
        self.update_booking(id, &BookingUpdate::status(status))
    }

    /// Delete a booking. Returns whether a row was removed.
    pub fn delete_booking(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM ambulance_bookings WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct BookingRow {
    id: String,
    booking_code: String,
    patient_name: String,
    patient_age: Option<u16>,
    patient_gender: Option<String>,
    phone_number: String,
    problem_type: Option<String>,
    dispatch_type: String,
    schedule_date: Option<NaiveDate>,
    schedule_time: Option<NaiveTime>,
    pickup_latitude: Option<f64>,
    pickup_longitude: Option<f64>,
    pickup_address: Option<String>,
    destination_address: Option<String>,
    notes: Option<String>,
    assigned_driver: Option<String>,
    status: String,
    created_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl BookingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            booking_code: row.get(1)?,
            patient_name: row.get(2)?,
            patient_age: row.get(3)?,
            patient_gender: row.get(4)?,
            phone_number: row.get(5)?,
            problem_type: row.get(6)?,
            dispatch_type: row.get(7)?,
            schedule_date: row.get(8)?,
            schedule_time: row.get(9)?,
            pickup_latitude: row.get(10)?,
            pickup_longitude: row.get(11)?,
            pickup_address: row.get(12)?,
            destination_address: row.get(13)?,
            notes: row.get(14)?,
            assigned_driver: row.get(15)?,
            status: row.get(16)?,
            created_by: row.get(17)?,
            created_at: row.get(18)?,
            updated_at: row.get(19)?,
        })
    }
}

impl TryFrom<BookingRow> for AmbulanceBooking {
    type Error = DbError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let dispatch = match (row.dispatch_type.as_str(), row.schedule_date, row.schedule_time) {
            ("Emergency", _, _) => Dispatch::Emergency,
            ("Scheduled", Some(date), Some(time)) => Dispatch::Scheduled { date, time },
            (other, _, _) => {
                return Err(DbError::Constraint(format!(
                    "Invalid dispatch on booking {}: {}",
                    row.id, other
                )))
            }
        };

        let status = BookingStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown booking status: {}", row.status)))?;

        let pickup = match (row.pickup_latitude, row.pickup_longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        };

        Ok(AmbulanceBooking {
            id: row.id,
            booking_code: row.booking_code,
            patient_name: row.patient_name,
            patient_age: row.patient_age,
            patient_gender: row.patient_gender,
            phone_number: row.phone_number,
            problem_type: row.problem_type,
            dispatch,
            pickup,
            pickup_address: row.pickup_address,
            destination_address: row.destination_address,
            notes: row.notes,
            assigned_driver: row.assigned_driver,
            status,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
