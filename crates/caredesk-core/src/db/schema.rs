//! SQLite schema definition.

/// Complete database schema for CareDesk.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Business identifier sequences
-- ============================================================================

-- One row per identifier prefix. Codes are issued by the triggers below and
-- never by the client.
CREATE TABLE IF NOT EXISTS id_sequences (
    prefix TEXT PRIMARY KEY,
    last_value INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO id_sequences (prefix, last_value) VALUES ('PAT', 0);
INSERT OR IGNORE INTO id_sequences (prefix, last_value) VALUES ('AMB', 0);
INSERT OR IGNORE INTO id_sequences (prefix, last_value) VALUES ('APT', 0);
INSERT OR IGNORE INTO id_sequences (prefix, last_value) VALUES ('RX', 0);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    patient_code TEXT UNIQUE,                    -- PAT-000001, set by trigger
    first_name TEXT NOT NULL CHECK (length(trim(first_name)) > 0),
    last_name TEXT NOT NULL CHECK (length(trim(last_name)) > 0),
    date_of_birth TEXT,
    gender TEXT,
    phone TEXT,
    email TEXT,
    address TEXT,
    city TEXT,
    state TEXT,
    pincode TEXT,
    blood_group TEXT,
    emergency_contact_name TEXT,
    emergency_contact_phone TEXT,
    medical_history TEXT,
    allergies TEXT,
    current_medications TEXT,
    photo_url TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_created ON patients(created_at);

CREATE TRIGGER IF NOT EXISTS patients_code_store_issued BEFORE INSERT ON patients
WHEN new.patient_code IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'patient_code is issued by the store');
END;

CREATE TRIGGER IF NOT EXISTS patients_assign_code AFTER INSERT ON patients
BEGIN
    UPDATE id_sequences SET last_value = last_value + 1 WHERE prefix = 'PAT';
    UPDATE patients
    SET patient_code = 'PAT-' || printf('%06d', (SELECT last_value FROM id_sequences WHERE prefix = 'PAT'))
    WHERE rowid = new.rowid;
END;

CREATE TRIGGER IF NOT EXISTS patients_code_immutable BEFORE UPDATE OF patient_code ON patients
WHEN old.patient_code IS NOT NULL AND new.patient_code IS NOT old.patient_code
BEGIN
    SELECT RAISE(ABORT, 'patient_code is immutable');
END;

-- ============================================================================
-- Ambulance Bookings (standalone: no patient reference)
-- ============================================================================

CREATE TABLE IF NOT EXISTS ambulance_bookings (
    id TEXT PRIMARY KEY,
    booking_code TEXT UNIQUE,                    -- AMB-000001, set by trigger
    patient_name TEXT NOT NULL CHECK (length(trim(patient_name)) > 0),
    patient_age INTEGER,
    patient_gender TEXT,
    phone_number TEXT NOT NULL CHECK (length(trim(phone_number)) > 0),
    problem_type TEXT,
    dispatch_type TEXT NOT NULL DEFAULT 'Emergency'
        CHECK (dispatch_type IN ('Emergency', 'Scheduled')),
    schedule_date TEXT,
    schedule_time TEXT,
    pickup_latitude REAL,
    pickup_longitude REAL,
    pickup_address TEXT,
    destination_address TEXT,
    notes TEXT,
    assigned_driver TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'confirmed', 'dispatched', 'completed', 'cancelled')),
    created_by TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    -- Scheduled dispatch needs both date and time; emergencies carry neither
    CHECK (dispatch_type = 'Emergency' OR (schedule_date IS NOT NULL AND schedule_time IS NOT NULL)),
    CHECK (dispatch_type = 'Scheduled' OR (schedule_date IS NULL AND schedule_time IS NULL)),
    CHECK ((pickup_latitude IS NULL) = (pickup_longitude IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_bookings_created ON ambulance_bookings(created_at);
CREATE INDEX IF NOT EXISTS idx_bookings_status ON ambulance_bookings(status);

CREATE TRIGGER IF NOT EXISTS ambulance_bookings_code_store_issued BEFORE INSERT ON ambulance_bookings
WHEN new.booking_code IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'booking_code is issued by the store');
END;

CREATE TRIGGER IF NOT EXISTS ambulance_bookings_assign_code AFTER INSERT ON ambulance_bookings
BEGIN
    UPDATE id_sequences SET last_value = last_value + 1 WHERE prefix = 'AMB';
    UPDATE ambulance_bookings
    SET booking_code = 'AMB-' || printf('%06d', (SELECT last_value FROM id_sequences WHERE prefix = 'AMB'))
    WHERE rowid = new.rowid;
END;

CREATE TRIGGER IF NOT EXISTS ambulance_bookings_code_immutable BEFORE UPDATE OF booking_code ON ambulance_bookings
WHEN old.booking_code IS NOT NULL AND new.booking_code IS NOT old.booking_code
BEGIN
    SELECT RAISE(ABORT, 'booking_code is immutable');
END;

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    appointment_code TEXT UNIQUE,                -- APT-000001, set by trigger
    patient_id TEXT REFERENCES patients(id) ON DELETE SET NULL,
    doctor_id TEXT,
    appointment_date TEXT NOT NULL CHECK (length(appointment_date) > 0),
    appointment_time TEXT NOT NULL CHECK (length(appointment_time) > 0),
    department TEXT,
    reason TEXT,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'scheduled'
        CHECK (status IN ('scheduled', 'confirmed', 'completed', 'cancelled', 'no-show')),
    created_by TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_slot ON appointments(appointment_date, appointment_time);

CREATE TRIGGER IF NOT EXISTS appointments_code_store_issued BEFORE INSERT ON appointments
WHEN new.appointment_code IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'appointment_code is issued by the store');
END;

CREATE TRIGGER IF NOT EXISTS appointments_assign_code AFTER INSERT ON appointments
BEGIN
    UPDATE id_sequences SET last_value = last_value + 1 WHERE prefix = 'APT';
    UPDATE appointments
    SET appointment_code = 'APT-' || printf('%06d', (SELECT last_value FROM id_sequences WHERE prefix = 'APT'))
    WHERE rowid = new.rowid;
END;

CREATE TRIGGER IF NOT EXISTS appointments_code_immutable BEFORE UPDATE OF appointment_code ON appointments
WHEN old.appointment_code IS NOT NULL AND new.appointment_code IS NOT old.appointment_code
BEGIN
    SELECT RAISE(ABORT, 'appointment_code is immutable');
END;

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    id TEXT PRIMARY KEY,
    prescription_code TEXT UNIQUE,               -- RX-000001, set by trigger
    patient_id TEXT REFERENCES patients(id) ON DELETE SET NULL,
    doctor_id TEXT,
    diagnosis TEXT,
    symptoms TEXT,
    medications TEXT NOT NULL DEFAULT '[]' CHECK (json_valid(medications)),
    instructions TEXT,
    follow_up_date TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_patient ON prescriptions(patient_id);
CREATE INDEX IF NOT EXISTS idx_prescriptions_created ON prescriptions(created_at);

CREATE TRIGGER IF NOT EXISTS prescriptions_code_store_issued BEFORE INSERT ON prescriptions
WHEN new.prescription_code IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'prescription_code is issued by the store');
END;

CREATE TRIGGER IF NOT EXISTS prescriptions_assign_code AFTER INSERT ON prescriptions
BEGIN
    UPDATE id_sequences SET last_value = last_value + 1 WHERE prefix = 'RX';
    UPDATE prescriptions
    SET prescription_code = 'RX-' || printf('%06d', (SELECT last_value FROM id_sequences WHERE prefix = 'RX'))
    WHERE rowid = new.rowid;
END;

CREATE TRIGGER IF NOT EXISTS prescriptions_code_immutable BEFORE UPDATE OF prescription_code ON prescriptions
WHEN old.prescription_code IS NOT NULL AND new.prescription_code IS NOT old.prescription_code
BEGIN
    SELECT RAISE(ABORT, 'prescription_code is immutable');
END;
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_client_supplied_code_rejected() {
        let conn = setup();
        let result = conn.execute(
            "INSERT INTO patients (id, patient_code, first_name, last_name) VALUES ('k0', 'PAT-CLIENT', 'Ann', 'Lee')",
            [],
        );
        assert!(result.is_err());

        conn.execute(
            "INSERT INTO patients (id, first_name, last_name) VALUES ('k1', 'Ann', 'Lee')",
            [],
        )
        .unwrap();

        let code: String = conn
            .query_row("SELECT patient_code FROM patients WHERE id = 'k1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(code, "PAT-000001");
    }

    #[test]
    fn test_code_is_immutable() {
        let conn = setup();
        conn.execute(
            "INSERT INTO ambulance_bookings (id, patient_name, phone_number) VALUES ('b1', 'Ann', '555')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "UPDATE ambulance_bookings SET booking_code = 'AMB-999999' WHERE id = 'b1'",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_scheduled_dispatch_requires_slot() {
        let conn = setup();

        // Scheduled without date/time is rejected by the store
        let result = conn.execute(
            "INSERT INTO ambulance_bookings (id, patient_name, phone_number, dispatch_type) VALUES ('b1', 'Ann', '555', 'Scheduled')",
            [],
        );
        assert!(result.is_err());

        // Emergency with a slot is rejected too
        let result = conn.execute(
            "INSERT INTO ambulance_bookings (id, patient_name, phone_number, dispatch_type, schedule_date, schedule_time) VALUES ('b2', 'Ann', '555', 'Emergency', '2026-10-16', '09:00')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO ambulance_bookings (id, patient_name, phone_number, dispatch_type, schedule_date, schedule_time) VALUES ('b3', 'Ann', '555', 'Scheduled', '2026-10-16', '09:00')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_blank_names_rejected() {
        let conn = setup();
        let result = conn.execute(
            "INSERT INTO patients (id, first_name, last_name) VALUES ('k1', '   ', 'Lee')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_patient_delete_nulls_references() {
        let conn = setup();
        conn.execute(
            "INSERT INTO patients (id, first_name, last_name) VALUES ('p1', 'Ann', 'Lee')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO appointments (id, patient_id, appointment_date, appointment_time) VALUES ('a1', 'p1', '2026-10-16', '09:00:00')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM patients WHERE id = 'p1'", []).unwrap();

        let patient_id: Option<String> = conn
            .query_row("SELECT patient_id FROM appointments WHERE id = 'a1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(patient_id, None);
    }
}
