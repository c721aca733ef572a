//! CareDesk Core Library
//!
//! Record keeping for a hospital front desk: patient registration, ambulance
//! dispatch, appointment scheduling and prescriptions, plus a live
//! operations dashboard.
//!
//! # Architecture
//!
//! ```text
//!   caller ──► CareDesk ──► Database (SQLite) ──► rows
//!                 │  ▲            │
//!                 │  └── Authenticator (who is signed in)
//!                 ▼
//!            ChangeFeed ──► LiveDashboard ──► re-runs Dashboard::load
//! ```
//!
//! The store assigns storage keys, timestamps, default statuses and the
//! human-readable business identifiers (`PAT-`, `AMB-`, `APT-`, `RX-`).
//! Writes are published on the change feed once committed.
//!
//! # Modules
//!
//! - [`db`]: SQLite store with one accessor file per entity
//! - [`models`]: Domain types (Patient, AmbulanceBooking, Appointment, Prescription)
//! - [`feed`]: Per-table change notifications
//! - [`dashboard`]: Operational metrics and the live dashboard
//! - [`search`]: Client-side list filtering and status classification
//! - [`auth`]: Authentication boundary
//! - [`config`]: Layered settings
//! - [`telemetry`]: Tracing setup

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod feed;
pub mod models;
pub mod search;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{Authenticator, PrincipalId, SessionAuth};
pub use config::{CalendarBasis, CareDeskConfig};
pub use dashboard::{Dashboard, DashboardSnapshot, DashboardStats, LiveDashboard};
pub use db::{Database, DbError};
pub use feed::{ChangeEvent, ChangeFeed, ChangeKind, Subscription, Table};
pub use models::{
    AmbulanceBooking, Appointment, AppointmentStatus, BookingStatus, Dispatch, Joined,
    Medication, Patient, Prescription,
};

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::Serialize;

use models::{
    AppointmentUpdate, BookingUpdate, NewAppointment, NewBooking, NewPatient, NewPrescription,
    PatientUpdate, PrescriptionUpdate,
};

// =========================================================================
// Error Type
// =========================================================================

#[derive(Debug, thiserror::Error)]
pub enum CareDeskError {
    #[error(transparent)]
    Store(#[from] DbError),

    #[error("Lock poisoned: {0}")]
    Lock(String),
}

impl<T> From<std::sync::PoisonError<T>> for CareDeskError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CareDeskError::Lock(e.to_string())
    }
}

impl CareDeskError {
    /// True when the failure is a missing record on update.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CareDeskError::Store(DbError::NotFound(_)))
    }

    /// True when the store rejected the write (missing field, bad reference,
    /// duplicate identifier).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, CareDeskError::Store(DbError::Constraint(_)))
    }
}

pub type CareDeskResult<T> = Result<T, CareDeskError>;

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe accessor facade.
///
/// Holds the store, the injected authenticator and the change feed. Nothing
/// here is global: construct one per store and share it behind an `Arc`.
pub struct CareDesk {
    db: Arc<Mutex<Database>>,
    auth: Arc<dyn Authenticator>,
    feed: ChangeFeed,
    config: CareDeskConfig,
}

impl CareDesk {
    /// Open the store described by `config`.
    pub fn open(config: CareDeskConfig, auth: Arc<dyn Authenticator>) -> CareDeskResult<Self> {
        let db = match &config.database.path {
            Some(path) => Database::open(path)?,
            None => Database::open_in_memory()?,
        };
        tracing::info!(path = ?config.database.path, "store opened");
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            auth,
            feed: ChangeFeed::new(),
            config,
        })
    }

    /// In-memory store with default settings.
    pub fn open_in_memory(auth: Arc<dyn Authenticator>) -> CareDeskResult<Self> {
        Self::open(CareDeskConfig::default(), auth)
    }

    pub fn config(&self) -> &CareDeskConfig {
        &self.config
    }

    /// The change feed writes are published on.
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Today's date under the configured calendar.
    pub fn today(&self) -> NaiveDate {
        self.config.calendar.today()
    }

    /// End the current session via the auth collaborator.
    pub fn sign_out(&self) {
        self.auth.sign_out();
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> db::DbResult<T>) -> CareDeskResult<T> {
        let db = self.db.lock()?;
        Ok(f(&db)?)
    }

    fn publish<R: Serialize>(&self, table: Table, kind: ChangeKind, key: &str, row: Option<&R>) {
        let new_row = row.and_then(|row| serde_json::to_value(row).ok());
        self.feed.publish(ChangeEvent {
            table,
            kind,
            key: key.to_string(),
            new_row,
        });
    }

    fn publish_delete(&self, table: Table, key: &str, removed: bool) {
        if removed {
            self.publish::<()>(table, ChangeKind::Delete, key, None);
        }
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// All patients, newest registration first.
    pub fn list_patients(&self) -> CareDeskResult<Vec<Patient>> {
        let patients = self.with_db(|db| db.list_patients())?;
        tracing::debug!(count = patients.len(), "listed patients");
        Ok(patients)
    }

    /// Patient by storage key; `None` when there is no such patient.
    pub fn get_patient(&self, id: &str) -> CareDeskResult<Option<Patient>> {
        self.with_db(|db| db.get_patient(id))
    }

    /// Register a patient, stamped with the signed-in principal.
    pub fn create_patient(&self, patient: &NewPatient) -> CareDeskResult<Patient> {
        let actor = self.auth.current_principal();
        let created = self.with_db(|db| db.create_patient(actor.as_ref(), patient))?;
        tracing::info!(code = %created.patient_code, "patient registered");
        self.publish(Table::Patients, ChangeKind::Insert, &created.id, Some(&created));
        Ok(created)
    }

    pub fn update_patient(&self, id: &str, update: &PatientUpdate) -> CareDeskResult<Patient> {
        let updated = self.with_db(|db| db.update_patient(id, update))?;
        tracing::info!(code = %updated.patient_code, "patient updated");
        self.publish(Table::Patients, ChangeKind::Update, id, Some(&updated));
        Ok(updated)
    }

    /// Hard delete. Deleting an unknown key succeeds.
    pub fn delete_patient(&self, id: &str) -> CareDeskResult<()> {
        let removed = self.with_db(|db| db.delete_patient(id))?;
        tracing::info!(id, removed, "patient deleted");
        self.publish_delete(Table::Patients, id, removed);
        Ok(())
    }

    // =========================================================================
    // Ambulance Booking Operations
    // =========================================================================

    /// All bookings, newest first.
    pub fn list_bookings(&self) -> CareDeskResult<Vec<AmbulanceBooking>> {
        let bookings = self.with_db(|db| db.list_bookings())?;
        tracing::debug!(count = bookings.len(), "listed ambulance bookings");
        Ok(bookings)
    }

    pub fn get_booking(&self, id: &str) -> CareDeskResult<Option<AmbulanceBooking>> {
        self.with_db(|db| db.get_booking(id))
    }

    pub fn create_booking(&self, booking: &NewBooking) -> CareDeskResult<AmbulanceBooking> {
        let actor = self.auth.current_principal();
        let created = self.with_db(|db| db.create_booking(actor.as_ref(), booking))?;
        tracing::info!(
            code = %created.booking_code,
            dispatch = created.dispatch.as_str(),
            "ambulance booked"
        );
        self.publish(
            Table::AmbulanceBookings,
            ChangeKind::Insert,
            &created.id,
            Some(&created),
        );
        Ok(created)
    }

    pub fn update_booking(
        &self,
        id: &str,
        update: &BookingUpdate,
    ) -> CareDeskResult<AmbulanceBooking> {
        let updated = self.with_db(|db| db.update_booking(id, update))?;
        tracing::info!(
            code = %updated.booking_code,
            status = updated.status.as_str(),
            "ambulance booking updated"
        );
        self.publish(Table::AmbulanceBookings, ChangeKind::Update, id, Some(&updated));
        Ok(updated)
    }

    pub fn update_booking_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> CareDeskResult<AmbulanceBooking> {
        self.update_booking(id, &BookingUpdate::status(status))
    }

    pub fn delete_booking(&self, id: &str) -> CareDeskResult<()> {
        let removed = self.with_db(|db| db.delete_booking(id))?;
        tracing::info!(id, removed, "ambulance booking deleted");
        self.publish_delete(Table::AmbulanceBookings, id, removed);
        Ok(())
    }

    /// Receive every insert, update and delete on ambulance bookings.
    pub fn subscribe_bookings(&self) -> Subscription {
        self.feed.subscribe(Table::AmbulanceBookings)
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// All appointments by date and time, with patient details.
    pub fn list_appointments(&self) -> CareDeskResult<Vec<Joined<Appointment>>> {
        let appointments = self.with_db(|db| db.list_appointments())?;
        tracing::debug!(count = appointments.len(), "listed appointments");
        Ok(appointments)
    }

    /// Appointments dated today under the configured calendar, by time.
    pub fn list_today_appointments(&self) -> CareDeskResult<Vec<Joined<Appointment>>> {
        let today = self.today();
        let appointments = self.with_db(|db| db.list_appointments_on(today))?;
        tracing::debug!(%today, count = appointments.len(), "listed today's appointments");
        Ok(appointments)
    }

    pub fn list_appointments_for_patient(
        &self,
        patient_id: &str,
    ) -> CareDeskResult<Vec<Joined<Appointment>>> {
        self.with_db(|db| db.list_appointments_for_patient(patient_id))
    }

    pub fn get_appointment(&self, id: &str) -> CareDeskResult<Option<Joined<Appointment>>> {
        self.with_db(|db| db.get_appointment(id))
    }

    pub fn create_appointment(&self, appointment: &NewAppointment) -> CareDeskResult<Appointment> {
        let actor = self.auth.current_principal();
        let created = self.with_db(|db| db.create_appointment(actor.as_ref(), appointment))?;
        tracing::info!(
            code = %created.appointment_code,
            date = %created.appointment_date,
            "appointment scheduled"
        );
        self.publish(Table::Appointments, ChangeKind::Insert, &created.id, Some(&created));
        Ok(created)
    }

    pub fn update_appointment(
        &self,
        id: &str,
        update: &AppointmentUpdate,
    ) -> CareDeskResult<Appointment> {
        let updated = self.with_db(|db| db.update_appointment(id, update))?;
        tracing::info!(
            code = %updated.appointment_code,
            status = updated.status.as_str(),
            "appointment updated"
        );
        self.publish(Table::Appointments, ChangeKind::Update, id, Some(&updated));
        Ok(updated)
    }

    pub fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> CareDeskResult<Appointment> {
        self.update_appointment(id, &AppointmentUpdate::status(status))
    }

    pub fn delete_appointment(&self, id: &str) -> CareDeskResult<()> {
        let removed = self.with_db(|db| db.delete_appointment(id))?;
        tracing::info!(id, removed, "appointment deleted");
        self.publish_delete(Table::Appointments, id, removed);
        Ok(())
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    /// All prescriptions, newest first, with patient details.
    pub fn list_prescriptions(&self) -> CareDeskResult<Vec<Joined<Prescription>>> {
        let prescriptions = self.with_db(|db| db.list_prescriptions())?;
        tracing::debug!(count = prescriptions.len(), "listed prescriptions");
        Ok(prescriptions)
    }

    pub fn list_prescriptions_for_patient(
        &self,
        patient_id: &str,
    ) -> CareDeskResult<Vec<Joined<Prescription>>> {
        self.with_db(|db| db.list_prescriptions_for_patient(patient_id))
    }

    pub fn get_prescription(&self, id: &str) -> CareDeskResult<Option<Joined<Prescription>>> {
        self.with_db(|db| db.get_prescription(id))
    }

    pub fn create_prescription(
        &self,
        prescription: &NewPrescription,
    ) -> CareDeskResult<Prescription> {
        let actor = self.auth.current_principal();
        let created = self.with_db(|db| db.create_prescription(actor.as_ref(), prescription))?;
        tracing::info!(
            code = %created.prescription_code,
            medications = created.medications.len(),
            "prescription written"
        );
        self.publish(Table::Prescriptions, ChangeKind::Insert, &created.id, Some(&created));
        Ok(created)
    }

    pub fn update_prescription(
        &self,
        id: &str,
        update: &PrescriptionUpdate,
    ) -> CareDeskResult<Prescription> {
        let updated = self.with_db(|db| db.update_prescription(id, update))?;
        tracing::info!(code = %updated.prescription_code, "prescription updated");
        self.publish(Table::Prescriptions, ChangeKind::Update, id, Some(&updated));
        Ok(updated)
    }

    pub fn delete_prescription(&self, id: &str) -> CareDeskResult<()> {
        let removed = self.with_db(|db| db.delete_prescription(id))?;
        tracing::info!(id, removed, "prescription deleted");
        self.publish_delete(Table::Prescriptions, id, removed);
        Ok(())
    }
}
