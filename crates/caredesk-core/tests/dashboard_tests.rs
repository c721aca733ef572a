//! Dashboard aggregation and live refresh against a real store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use caredesk_core::dashboard::{DashboardState, DashboardStats};
use caredesk_core::models::{NewAppointment, NewBooking, NewPatient};
use caredesk_core::{
    BookingStatus, CareDesk, Dashboard, DashboardSnapshot, LiveDashboard, SessionAuth,
};
use chrono::{Duration as Days, NaiveDate, NaiveTime};

fn desk() -> Arc<CareDesk> {
    Arc::new(CareDesk::open_in_memory(Arc::new(SessionAuth::signed_in("ops-1"))).unwrap())
}

fn at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

fn tomorrow(desk: &CareDesk) -> NaiveDate {
    desk.today() + Days::days(1)
}

/// 3 patients, 4 bookings (2 active, 1 completed, 1 cancelled, one pending
/// emergency) and 2 appointments today plus one tomorrow.
fn seed(desk: &CareDesk) {
    let patients: Vec<_> = [("John", "Smith"), ("Jane", "Doe"), ("Ravi", "Kumar")]
        .into_iter()
        .map(|(first, last)| desk.create_patient(&NewPatient::new(first, last)).unwrap())
        .collect();

    desk.create_booking(&NewBooking::emergency("Ann Lee", "555-0101"))
        .unwrap();
    let scheduled = desk
        .create_booking(&NewBooking::scheduled("Bo Chan", "555-0102", tomorrow(desk), at(8)))
        .unwrap();
    desk.update_booking_status(&scheduled.id, BookingStatus::Confirmed)
        .unwrap();
    let done = desk
        .create_booking(&NewBooking::emergency("Cy Park", "555-0103"))
        .unwrap();
    desk.update_booking_status(&done.id, BookingStatus::Completed)
        .unwrap();
    let called_off = desk
        .create_booking(&NewBooking::emergency("Di Ross", "555-0104"))
        .unwrap();
    desk.update_booking_status(&called_off.id, BookingStatus::Cancelled)
        .unwrap();

    let today = desk.today();
    desk.create_appointment(&NewAppointment::new(&patients[0].id, today, at(9)))
        .unwrap();
    desk.create_appointment(&NewAppointment::new(&patients[1].id, today, at(11)))
        .unwrap();
    desk.create_appointment(&NewAppointment::new(&patients[2].id, tomorrow(desk), at(9)))
        .unwrap();
}

/// Wait until the live dashboard shows a snapshot satisfying `done`.
fn wait_until(
    dashboard: &LiveDashboard,
    done: impl Fn(&DashboardSnapshot) -> bool,
) -> DashboardSnapshot {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let generation = dashboard.generation();
        if let DashboardState::Ready(snapshot) = dashboard.state() {
            if done(&snapshot) {
                return snapshot;
            }
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        assert!(!remaining.is_zero(), "dashboard never reached expected state");
        dashboard.wait_for_refresh(generation, remaining);
    }
}

#[test]
fn test_headline_counts() {
    let desk = desk();
    seed(&desk);

    let snapshot = Dashboard::load(desk.as_ref()).unwrap();
    assert_eq!(
        snapshot.stats,
        DashboardStats {
            total_patients: 3,
            active_bookings: 2,
            today_appointments: 2,
            pending_emergencies: 1,
        }
    );
    assert_eq!(snapshot.recent_bookings.len(), 4);
    assert_eq!(snapshot.recent_bookings[0].patient_name, "Di Ross");
}

#[test]
fn test_recent_limit_applies() {
    let desk = desk();
    for i in 0..7 {
        desk.create_booking(&NewBooking::emergency(format!("Caller {i}"), "555"))
            .unwrap();
    }

    let snapshot = Dashboard::load_with_limit(desk.as_ref(), 3).unwrap();
    let names: Vec<&str> = snapshot
        .recent_bookings
        .iter()
        .map(|b| b.patient_name.as_str())
        .collect();
    assert_eq!(names, vec!["Caller 6", "Caller 5", "Caller 4"]);
    assert_eq!(snapshot.stats.pending_emergencies, 7);
}

#[test]
fn test_live_dashboard_follows_booking_changes() {
    let desk = desk();
    let dashboard = LiveDashboard::activate(Arc::clone(&desk)).unwrap();

    wait_until(&dashboard, |s| s.stats.active_bookings == 0);

    let booking = desk
        .create_booking(&NewBooking::emergency("Ann Lee", "555-0101"))
        .unwrap();
    let snapshot = wait_until(&dashboard, |s| s.stats.pending_emergencies == 1);
    assert_eq!(snapshot.recent_bookings[0].id, booking.id);

    desk.update_booking_status(&booking.id, BookingStatus::Dispatched)
        .unwrap();
    wait_until(&dashboard, |s| {
        s.stats.pending_emergencies == 0 && s.stats.active_bookings == 1
    });

    desk.delete_booking(&booking.id).unwrap();
    wait_until(&dashboard, |s| s.recent_bookings.is_empty());
}

#[test]
fn test_dropping_live_dashboard_unsubscribes() {
    let desk = desk();
    let dashboard = LiveDashboard::activate(Arc::clone(&desk)).unwrap();
    assert_eq!(desk.feed().subscriber_count(), 1);

    drop(dashboard);
    assert_eq!(desk.feed().subscriber_count(), 0);
}
