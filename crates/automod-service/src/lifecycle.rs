//! Service lifecycle: shared state, health snapshots, idle shutdown
//!
//! One `ServiceState` instance is created before the listener binds and
//! passed by `Arc` into the request handlers and the idle watchdog; there
//! are no ambient globals. The watchdog does not kill the process directly:
//! it signals a watch channel that the server consumes for graceful
//! shutdown, so in-flight responses complete.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

/// Interval between idle re-checks after the first full idle period
pub const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(300);

/// Process-wide service state
pub struct ServiceState {
    model_loaded: AtomicBool,
    started: Instant,
    started_at: DateTime<Utc>,
    last_activity: RwLock<Option<Activity>>,
    idle_timeout: Duration,
}

#[derive(Clone, Copy)]
struct Activity {
    instant: Instant,
    at: DateTime<Utc>,
}

impl ServiceState {
    /// Create state for a freshly started process
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            model_loaded: AtomicBool::new(false),
            started: Instant::now(),
            started_at: Utc::now(),
            last_activity: RwLock::new(None),
            idle_timeout,
        }
    }

    /// Record that the model finished loading
    pub fn mark_model_loaded(&self) {
        self.model_loaded.store(true, Ordering::SeqCst);
    }

    /// Whether the model is loaded
    pub fn model_loaded(&self) -> bool {
        self.model_loaded.load(Ordering::SeqCst)
    }

    /// Record activity; called on every moderation request
    pub fn touch(&self) {
        *self.last_activity.write() = Some(Activity {
            instant: Instant::now(),
            at: Utc::now(),
        });
    }

    /// Time since the last request, counted from process start if the
    /// service has never been used
    pub fn idle_for(&self) -> Duration {
        self.last_activity
            .read()
            .map(|activity| activity.instant.elapsed())
            .unwrap_or_else(|| self.started.elapsed())
    }

    /// The configured idle timeout
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Read-only health snapshot; mutates nothing
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: "healthy".to_string(),
            model_loaded: self.model_loaded(),
            last_used: self.last_activity.read().map(|activity| activity.at),
            uptime: format_uptime(Utc::now() - self.started_at),
        }
    }
}

/// Health endpoint payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Always "healthy" when the process responds
    pub status: String,

    /// Whether the model finished loading
    pub model_loaded: bool,

    /// When the last moderation request arrived, if any
    pub last_used: Option<DateTime<Utc>>,

    /// Time since process start, `H:MM:SS`
    pub uptime: String,
}

/// Format a duration as `H:MM:SS`
fn format_uptime(elapsed: chrono::Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Background idle watchdog.
///
/// Sleeps one full idle period, then re-checks on `check_interval`. When
/// the service has been idle for at least the configured timeout it sends
/// the shutdown signal and exits; a request arriving before expiry
/// effectively re-arms the timer because `idle_for` restarts from the last
/// activity.
pub async fn idle_watchdog(
    state: std::sync::Arc<ServiceState>,
    check_interval: Duration,
    shutdown: watch::Sender<()>,
) {
    tokio::time::sleep(state.idle_timeout()).await;

    loop {
        let idle = state.idle_for();
        if idle >= state.idle_timeout() {
            info!(
                idle_min = idle.as_secs() / 60,
                "service idle past timeout, requesting shutdown"
            );
            let _ = shutdown.send(());
            return;
        }
        debug!(idle_s = idle.as_secs(), "idle check passed");
        tokio::time::sleep(check_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(chrono::Duration::seconds(0)), "0:00:00");
        assert_eq!(format_uptime(chrono::Duration::seconds(62)), "0:01:02");
        assert_eq!(format_uptime(chrono::Duration::seconds(3661)), "1:01:01");
    }

    #[test]
    fn snapshot_reflects_state() {
        let state = ServiceState::new(Duration::from_secs(60));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, "healthy");
        assert!(!snapshot.model_loaded);
        assert!(snapshot.last_used.is_none());

        state.mark_model_loaded();
        state.touch();
        let snapshot = state.snapshot();
        assert!(snapshot.model_loaded);
        assert!(snapshot.last_used.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_fires_when_never_used() {
        let state = Arc::new(ServiceState::new(Duration::from_secs(1)));
        let (tx, rx) = watch::channel(());
        tokio::spawn(idle_watchdog(state, Duration::from_millis(300), tx));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        // The watchdog drops the sender after signalling; a closed channel
        // still means the shutdown signal was sent.
        assert!(rx.has_changed().unwrap_or(true));
    }

    #[tokio::test(start_paused = true)]
    async fn activity_re_arms_the_watchdog() {
        let state = Arc::new(ServiceState::new(Duration::from_secs(1)));
        let (tx, rx) = watch::channel(());
        tokio::spawn(idle_watchdog(state.clone(), Duration::from_millis(300), tx));

        // Activity just before the first check keeps the service alive
        tokio::time::sleep(Duration::from_millis(800)).await;
        state.touch();
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert!(!rx.has_changed().unwrap());

        // No further activity: the next checks cross the timeout
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(rx.has_changed().unwrap_or(true));
    }
}
