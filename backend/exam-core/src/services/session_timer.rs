use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, Stream};
use tokio::time::{sleep, sleep_until, Instant};

use crate::models::timer::{TimeExpired, TimerEvent, TimerTick};

/// Countdown clock for a timed session.
///
/// The expiry callback fires exactly once; `stop()` prevents it from firing
/// even when the wakeup is already scheduled. Remaining time saturates at
/// zero. Must be started inside a tokio runtime.
pub struct SessionTimer {
    total_seconds: u32,
    critical_threshold_seconds: u32,
    started: Instant,
    deadline: Instant,
    stopped: Arc<AtomicBool>,
    fired: Arc<AtomicBool>,
}

impl SessionTimer {
    pub fn start<F>(total_seconds: u32, critical_threshold_seconds: u32, on_expire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let started = Instant::now();
        let deadline = started + Duration::from_secs(u64::from(total_seconds));
        let stopped = Arc::new(AtomicBool::new(false));
        let fired = Arc::new(AtomicBool::new(false));

        let task_stopped = Arc::clone(&stopped);
        let task_fired = Arc::clone(&fired);
        tokio::spawn(async move {
            sleep_until(deadline).await;
            if task_stopped.load(Ordering::SeqCst) {
                return;
            }
            // The fired flag is the exactly-once guard; stop() racing the
            // wakeup is resolved by the session's own submit guard.
            if task_fired
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                on_expire();
            }
        });

        Self {
            total_seconds,
            critical_threshold_seconds,
            started,
            deadline,
            stopped,
            fired,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    /// Seconds until expiry, never negative.
    pub fn remaining_seconds(&self) -> u32 {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        u32::try_from(remaining.as_secs()).unwrap_or(u32::MAX)
    }

    pub fn elapsed_seconds(&self) -> u32 {
        let elapsed = Instant::now().saturating_duration_since(self.started);
        u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX)
    }

    /// Display hint only; carries no scoring semantics.
    pub fn is_critical(&self) -> bool {
        self.remaining_seconds() < self.critical_threshold_seconds
    }

    pub fn has_expired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Prevents any further expiry callback, even one already scheduled.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Per-second timer events for host display, ending with a single
/// `TimeExpired`.
pub fn timer_event_stream(
    session_id: String,
    total_seconds: u32,
    critical_threshold_seconds: u32,
    tick_interval_ms: u64,
) -> impl Stream<Item = TimerEvent> {
    stream::unfold(
        (session_id, 0u32, total_seconds, false),
        move |(sid, elapsed, total, final_sent)| async move {
            if final_sent {
                return None;
            }

            if elapsed >= total {
                // Send final time-expired event once
                let expired = TimerEvent::TimeExpired(TimeExpired {
                    session_id: sid.clone(),
                    timestamp: Utc::now(),
                    message: "Time limit exceeded".to_string(),
                });
                tracing::info!("Timer expired: session={}", sid);
                return Some((expired, (sid, elapsed, total, true)));
            }

            let remaining = total.saturating_sub(elapsed);
            let tick = TimerEvent::TimerTick(TimerTick {
                session_id: sid.clone(),
                remaining_seconds: remaining,
                elapsed_seconds: elapsed,
                total_seconds: total,
                critical: remaining < critical_threshold_seconds,
                timestamp: Utc::now(),
            });

            // Wait one interval before the next tick
            sleep(Duration::from_millis(tick_interval_ms)).await;

            Some((tick, (sid, elapsed + 1, total, false)))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::AtomicU32;

    #[tokio::test(start_paused = true)]
    async fn expiry_fires_exactly_once() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let timer = SessionTimer::start(10, 300, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_secs(11)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(timer.has_expired());

        // stop() after the fact must not allow a second fire
        timer.stop();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_a_scheduled_expiry() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let timer = SessionTimer::start(10, 300, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        timer.stop();
        sleep(Duration::from_secs(30)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!timer.has_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_never_goes_negative() {
        let timer = SessionTimer::start(5, 300, || {});
        assert_eq!(timer.remaining_seconds(), 5);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(timer.remaining_seconds(), 0);
        assert!(timer.elapsed_seconds() >= 60);
    }

    #[tokio::test(start_paused = true)]
    async fn critical_state_tracks_the_threshold() {
        let timer = SessionTimer::start(400, 300, || {});
        assert!(!timer.is_critical());

        sleep(Duration::from_secs(150)).await;
        assert!(timer.is_critical());
    }

    #[tokio::test(start_paused = true)]
    async fn event_stream_ends_with_a_single_expiry() {
        let events: Vec<TimerEvent> =
            timer_event_stream("s1".to_string(), 3, 300, 1000).collect().await;

        assert_eq!(events.len(), 4);
        for event in &events[..3] {
            assert_eq!(event.event_name(), "timer-tick");
        }
        assert_eq!(events[3].event_name(), "time-expired");

        match &events[0] {
            TimerEvent::TimerTick(tick) => {
                assert_eq!(tick.remaining_seconds, 3);
                assert!(tick.critical);
            }
            other => panic!("expected tick, got {:?}", other),
        }
    }
}
