//! Operations dashboard.
//!
//! [`Dashboard::load`] fetches patients, bookings and today's appointments
//! concurrently and reduces them to [`DashboardStats`]. Aggregation is
//! all-or-nothing: if any fetch fails, no stats are produced.
//!
//! [`LiveDashboard`] keeps a snapshot current by reloading on every
//! ambulance booking change.

mod live;

pub use live::{DashboardState, LiveDashboard};

use std::thread;

use serde::{Deserialize, Serialize};

use crate::models::{AmbulanceBooking, Appointment, Joined, Patient};
use crate::{CareDesk, CareDeskError, CareDeskResult};

/// Number of bookings shown in the recent list unless configured otherwise.
pub const DEFAULT_RECENT_BOOKINGS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Dashboard fetch failed: {0}")]
    Fetch(#[from] CareDeskError),

    #[error("Dashboard fetch panicked")]
    FetchPanicked,

    #[error("Failed to start dashboard refresher: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Headline counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_patients: usize,
    /// Bookings neither completed nor cancelled
    pub active_bookings: usize,
    pub today_appointments: usize,
    /// Emergency bookings still awaiting acknowledgement
    pub pending_emergencies: usize,
}

/// Stats plus the most recent bookings, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub recent_bookings: Vec<AmbulanceBooking>,
}

/// The three collections the dashboard is computed from.
pub trait DashboardSource {
    fn fetch_patients(&self) -> CareDeskResult<Vec<Patient>>;

    /// Bookings, newest first.
    fn fetch_bookings(&self) -> CareDeskResult<Vec<AmbulanceBooking>>;

    fn fetch_today_appointments(&self) -> CareDeskResult<Vec<Joined<Appointment>>>;
}

impl DashboardSource for CareDesk {
    fn fetch_patients(&self) -> CareDeskResult<Vec<Patient>> {
        self.list_patients()
    }

    fn fetch_bookings(&self) -> CareDeskResult<Vec<AmbulanceBooking>> {
        self.list_bookings()
    }

    fn fetch_today_appointments(&self) -> CareDeskResult<Vec<Joined<Appointment>>> {
        self.list_today_appointments()
    }
}

/// Reduce fetched collections to a snapshot.
///
/// `bookings` must already be ordered newest first.
pub fn aggregate(
    patients: &[Patient],
    mut bookings: Vec<AmbulanceBooking>,
    today: &[Joined<Appointment>],
    recent_limit: usize,
) -> DashboardSnapshot {
    let stats = DashboardStats {
        total_patients: patients.len(),
        active_bookings: bookings.iter().filter(|b| b.status.is_active()).count(),
        today_appointments: today.len(),
        pending_emergencies: bookings.iter().filter(|b| b.is_pending_emergency()).count(),
    };

    bookings.truncate(recent_limit);

    DashboardSnapshot {
        stats,
        recent_bookings: bookings,
    }
}

/// One-shot dashboard loader.
pub struct Dashboard;

impl Dashboard {
    /// Load with the default recent-bookings limit.
    pub fn load<S>(source: &S) -> Result<DashboardSnapshot, DashboardError>
    where
        S: DashboardSource + Sync + ?Sized,
    {
        Self::load_with_limit(source, DEFAULT_RECENT_BOOKINGS)
    }

    /// Issue all three fetches at once and wait for every one of them.
    pub fn load_with_limit<S>(
        source: &S,
        recent_limit: usize,
    ) -> Result<DashboardSnapshot, DashboardError>
    where
        S: DashboardSource + Sync + ?Sized,
    {
        let (patients, bookings, today) = thread::scope(|scope| {
            let patients = scope.spawn(|| source.fetch_patients());
            let bookings = scope.spawn(|| source.fetch_bookings());
            let today = scope.spawn(|| source.fetch_today_appointments());
            (patients.join(), bookings.join(), today.join())
        });

        let patients = patients.map_err(|_| DashboardError::FetchPanicked)??;
        let bookings = bookings.map_err(|_| DashboardError::FetchPanicked)??;
        let today = today.map_err(|_| DashboardError::FetchPanicked)??;

        let snapshot = aggregate(&patients, bookings, &today, recent_limit);
        tracing::debug!(
            patients = snapshot.stats.total_patients,
            active_bookings = snapshot.stats.active_bookings,
            today = snapshot.stats.today_appointments,
            pending_emergencies = snapshot.stats.pending_emergencies,
            "dashboard loaded"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::models::{BookingStatus, Dispatch, NewBooking};
    use chrono::{NaiveDate, NaiveTime};

    fn booking(code: &str, status: BookingStatus, dispatch: Dispatch) -> AmbulanceBooking {
        let mut new = NewBooking::emergency("Ann", "555");
        new.dispatch = dispatch;
        AmbulanceBooking {
            id: code.to_lowercase(),
            booking_code: code.to_string(),
            patient_name: new.patient_name,
            patient_age: None,
            patient_gender: None,
            phone_number: new.phone_number,
            problem_type: None,
            dispatch: new.dispatch,
            pickup: None,
            pickup_address: None,
            destination_address: None,
            notes: None,
            assigned_driver: None,
            status,
            created_by: None,
            created_at: "2026-10-16T08:00:00.000Z".into(),
            updated_at: "2026-10-16T08:00:00.000Z".into(),
        }
    }

    fn scheduled() -> Dispatch {
        Dispatch::Scheduled {
            date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_aggregate_counts() {
        let bookings = vec![
            booking("AMB-000004", BookingStatus::Pending, Dispatch::Emergency),
            booking("AMB-000003", BookingStatus::Dispatched, scheduled()),
            booking("AMB-000002", BookingStatus::Completed, Dispatch::Emergency),
            booking("AMB-000001", BookingStatus::Cancelled, Dispatch::Emergency),
        ];

        let snapshot = aggregate(&[], bookings, &[], 5);
        assert_eq!(snapshot.stats.active_bookings, 2);
        assert_eq!(snapshot.stats.pending_emergencies, 1);
        assert_eq!(snapshot.recent_bookings.len(), 4);
    }

    #[test]
    fn test_recent_keeps_newest() {
        let bookings: Vec<_> = (0..8)
            .rev()
            .map(|n| booking(&format!("AMB-00000{n}"), BookingStatus::Pending, scheduled()))
            .collect();

        let snapshot = aggregate(&[], bookings, &[], 5);
        let codes: Vec<&str> = snapshot
            .recent_bookings
            .iter()
            .map(|b| b.booking_code.as_str())
            .collect();
        assert_eq!(
            codes,
            vec!["AMB-000007", "AMB-000006", "AMB-000005", "AMB-000004", "AMB-000003"]
        );
        assert_eq!(snapshot.stats.pending_emergencies, 0);
    }

    struct BrokenBookings;

    impl DashboardSource for BrokenBookings {
        fn fetch_patients(&self) -> CareDeskResult<Vec<Patient>> {
            Ok(Vec::new())
        }

        fn fetch_bookings(&self) -> CareDeskResult<Vec<AmbulanceBooking>> {
            Err(DbError::NotFound("ambulance_bookings".into()).into())
        }

        fn fetch_today_appointments(&self) -> CareDeskResult<Vec<Joined<Appointment>>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_one_failed_fetch_fails_the_load() {
        let err = Dashboard::load(&BrokenBookings).unwrap_err();
        assert!(matches!(err, DashboardError::Fetch(_)));
    }

    struct PanickingPatients;

    impl DashboardSource for PanickingPatients {
        fn fetch_patients(&self) -> CareDeskResult<Vec<Patient>> {
            panic!("patients fetch exploded")
        }

        fn fetch_bookings(&self) -> CareDeskResult<Vec<AmbulanceBooking>> {
            Ok(Vec::new())
        }

        fn fetch_today_appointments(&self) -> CareDeskResult<Vec<Joined<Appointment>>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_panicked_fetch_is_reported() {
        let err = Dashboard::load(&PanickingPatients).unwrap_err();
        assert!(matches!(err, DashboardError::FetchPanicked));
    }
}
