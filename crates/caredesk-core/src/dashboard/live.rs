//! Push-refreshed dashboard.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{Dashboard, DashboardError, DashboardSnapshot, DashboardSource};
use crate::feed::{Subscription, Unsubscriber};
use crate::CareDesk;

/// What the dashboard currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    /// No load has finished yet
    Loading,
    Ready(DashboardSnapshot),
    /// The most recent load failed; carries the error message
    Failed(String),
}

struct Progress {
    state: DashboardState,
    generation: u64,
}

struct Shared {
    progress: Mutex<Progress>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: DashboardState) {
        let mut progress = self.lock();
        progress.state = state;
        progress.generation += 1;
        self.changed.notify_all();
    }
}

/// Dashboard that reloads whenever an ambulance booking changes.
///
/// Every reload re-runs the full aggregation; events arriving while a
/// reload is in flight are coalesced into the next one.
pub struct LiveDashboard {
    shared: Arc<Shared>,
    unsubscriber: Unsubscriber,
    worker: Option<JoinHandle<()>>,
}

impl LiveDashboard {
    /// Subscribe to booking changes on `desk` and start refreshing.
    pub fn activate(desk: Arc<CareDesk>) -> Result<Self, DashboardError> {
        let subscription = desk.subscribe_bookings();
        let recent_limit = desk.config().dashboard.recent_bookings;
        Self::start(desk, subscription, recent_limit)
    }

    /// Run the initial load, then reload on every event from `subscription`.
    pub fn start(
        source: Arc<dyn DashboardSource + Send + Sync>,
        subscription: Subscription,
        recent_limit: usize,
    ) -> Result<Self, DashboardError> {
        let shared = Arc::new(Shared {
            progress: Mutex::new(Progress {
                state: DashboardState::Loading,
                generation: 0,
            }),
            changed: Condvar::new(),
        });
        let unsubscriber = subscription.unsubscriber();

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("dashboard-refresh".into())
            .spawn(move || {
                refresh(source.as_ref(), &worker_shared, recent_limit);
                while let Some(event) = subscription.recv() {
                    let mut coalesced = 0usize;
                    while subscription.try_recv().is_some() {
                        coalesced += 1;
                    }
                    tracing::debug!(
                        kind = ?event.kind,
                        key = %event.key,
                        coalesced,
                        "booking changed, reloading dashboard"
                    );
                    refresh(source.as_ref(), &worker_shared, recent_limit);
                }
                tracing::debug!("dashboard refresher stopped");
            })?;

        Ok(Self {
            shared,
            unsubscriber,
            worker: Some(worker),
        })
    }

    /// Current state.
    pub fn state(&self) -> DashboardState {
        self.shared.lock().state.clone()
    }

    /// Number of loads finished so far, successful or not.
    pub fn generation(&self) -> u64 {
        self.shared.lock().generation
    }

    /// Block until a load newer than `after` finishes. Returns the new
    /// generation, or `None` on timeout.
    pub fn wait_for_refresh(&self, after: u64, timeout: Duration) -> Option<u64> {
        let guard = self.shared.lock();
        let (guard, _) = self
            .shared
            .changed
            .wait_timeout_while(guard, timeout, |progress| progress.generation <= after)
            .unwrap_or_else(PoisonError::into_inner);
        (guard.generation > after).then_some(guard.generation)
    }

    /// Stop listening for changes and wait for the refresher to exit.
    pub fn shutdown(&mut self) {
        self.unsubscriber.cancel();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("dashboard refresher panicked");
            }
        }
    }
}

impl Drop for LiveDashboard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn refresh(source: &(dyn DashboardSource + Send + Sync), shared: &Shared, recent_limit: usize) {
    let state = match Dashboard::load_with_limit(source, recent_limit) {
        Ok(snapshot) => DashboardState::Ready(snapshot),
        Err(e) => {
            tracing::error!(error = %e, "dashboard load failed");
            DashboardState::Failed(e.to_string())
        }
    };
    shared.publish(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{ChangeEvent, ChangeFeed, ChangeKind, Table};
    use crate::models::{AmbulanceBooking, Appointment, Joined, Patient};
    use crate::{CareDeskError, CareDeskResult};
    use std::sync::atomic::{AtomicBool, Ordering};

    const WAIT: Duration = Duration::from_secs(5);

    /// Source whose booking fetch can be switched to fail.
    #[derive(Default)]
    struct Toggle {
        failing: AtomicBool,
    }

    impl DashboardSource for Toggle {
        fn fetch_patients(&self) -> CareDeskResult<Vec<Patient>> {
            Ok(Vec::new())
        }

        fn fetch_bookings(&self) -> CareDeskResult<Vec<AmbulanceBooking>> {
            if self.failing.load(Ordering::SeqCst) {
                Err(CareDeskError::Lock("store offline".into()))
            } else {
                Ok(Vec::new())
            }
        }

        fn fetch_today_appointments(&self) -> CareDeskResult<Vec<Joined<Appointment>>> {
            Ok(Vec::new())
        }
    }

    fn booking_event() -> ChangeEvent {
        ChangeEvent {
            table: Table::AmbulanceBookings,
            kind: ChangeKind::Insert,
            key: "b1".into(),
            new_row: None,
        }
    }

    #[test]
    fn test_initial_load_becomes_ready() {
        let feed = ChangeFeed::new();
        let source = Arc::new(Toggle::default());
        let dashboard =
            LiveDashboard::start(source, feed.subscribe(Table::AmbulanceBookings), 5).unwrap();

        assert_eq!(dashboard.wait_for_refresh(0, WAIT), Some(1));
        assert_eq!(
            dashboard.state(),
            DashboardState::Ready(DashboardSnapshot::default())
        );
    }

    #[test]
    fn test_event_triggers_reload() {
        let feed = ChangeFeed::new();
        let source = Arc::new(Toggle::default());
        let dashboard = LiveDashboard::start(
            source.clone(),
            feed.subscribe(Table::AmbulanceBookings),
            5,
        )
        .unwrap();
        let first = dashboard.wait_for_refresh(0, WAIT).unwrap();

        source.failing.store(true, Ordering::SeqCst);
        feed.publish(booking_event());

        assert!(dashboard.wait_for_refresh(first, WAIT).is_some());
        assert!(matches!(dashboard.state(), DashboardState::Failed(_)));
    }

    #[test]
    fn test_shutdown_releases_subscription() {
        let feed = ChangeFeed::new();
        let mut dashboard = LiveDashboard::start(
            Arc::new(Toggle::default()),
            feed.subscribe(Table::AmbulanceBookings),
            5,
        )
        .unwrap();
        assert_eq!(feed.subscriber_count(), 1);

        dashboard.shutdown();
        dashboard.shutdown();
        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(feed.publish(booking_event()), 0);
    }

    #[test]
    fn test_wait_times_out_without_changes() {
        let feed = ChangeFeed::new();
        let dashboard = LiveDashboard::start(
            Arc::new(Toggle::default()),
            feed.subscribe(Table::AmbulanceBookings),
            5,
        )
        .unwrap();
        let generation = dashboard.wait_for_refresh(0, WAIT).unwrap();

        assert_eq!(
            dashboard.wait_for_refresh(generation, Duration::from_millis(50)),
            None
        );
    }
}
