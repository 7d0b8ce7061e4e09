//! Resend countdown.
//!
//! One decrement per second until zero. At most one ticker task is alive per
//! countdown: restarting aborts the previous task before spawning a new one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

const TICK: Duration = Duration::from_secs(1);

/// Seconds remaining before "Resend OTP" is available.
#[derive(Debug)]
pub struct Countdown {
    start_from: u64,
    remaining: Arc<watch::Sender<u64>>,
    ticker: Option<JoinHandle<()>>,
}

impl Countdown {
    /// A stopped countdown showing `start_from`.
    #[must_use]
    pub fn new(start_from: u64) -> Self {
        let (tx, _) = watch::channel(start_from);
        Self {
            start_from,
            remaining: Arc::new(tx),
            ticker: None,
        }
    }

    /// Reset to the start value and begin ticking.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn restart(&mut self) {
        self.cancel();
        self.remaining.send_replace(self.start_from);

        let remaining = Arc::clone(&self.remaining);
        self.ticker = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            while *remaining.borrow() > 0 {
                ticks.tick().await;
                remaining.send_modify(|secs| *secs = secs.saturating_sub(1));
            }
            tracing::debug!("OTP countdown finished");
        }));
    }

    /// Stop ticking, keeping the current value.
    pub fn cancel(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    /// Stop ticking and show the start value again.
    pub fn reset(&mut self) {
        self.cancel();
        self.remaining.send_replace(self.start_from);
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        *self.remaining.borrow()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Observe the remaining seconds.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.subscribe()
    }

    /// Label for the resend link: "Resend OTP" or "Resend OTP (00:42)".
    #[must_use]
    pub fn label(&self) -> String {
        match self.remaining() {
            0 => "Resend OTP".to_string(),
            secs => format!("Resend OTP ({:02}:{:02})", secs / 60, secs % 60),
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_once_per_second() {
        let mut countdown = Countdown::new(60);
        countdown.restart();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(countdown.remaining(), 50);
        assert!(countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_zero() {
        let mut countdown = Countdown::new(60);
        countdown.restart();

        tokio::time::sleep(Duration::from_millis(60_500)).await;
        assert_eq!(countdown.remaining(), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_does_not_double_tick() {
        let mut countdown = Countdown::new(60);
        countdown.restart();
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        countdown.restart();
        countdown.restart();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(countdown.remaining(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_freezes_and_reset_restores() {
        let mut countdown = Countdown::new(60);
        countdown.restart();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        countdown.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(countdown.remaining(), 57);

        countdown.reset();
        assert_eq!(countdown.remaining(), 60);
        assert!(!countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_ticks() {
        let mut countdown = Countdown::new(3);
        let mut rx = countdown.subscribe();
        countdown.restart();

        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let value = *rx.borrow_and_update();
            seen.push(value);
            if value == 0 {
                break;
            }
        }
        assert_eq!(seen.last(), Some(&0));
    }

    #[test]
    fn test_label() {
        let countdown = Countdown::new(60);
        assert_eq!(countdown.label(), "Resend OTP (01:00)");
        let countdown = Countdown::new(0);
        assert_eq!(countdown.label(), "Resend OTP");
    }
}
