//! Offer screen shown over the app at launch.
//!
//! The gate closes once, either when its timer fires or when something closes
//! it early (a failed catalog fetch skips the intro). Both paths flip the same
//! flag, so the gate can never re-open.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct SplashGate {
    visible: Arc<watch::Sender<bool>>,
    timer: Option<JoinHandle<()>>,
}

impl Default for SplashGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SplashGate {
    /// A visible gate with no timer.
    #[must_use]
    pub fn new() -> Self {
        let (visible, _) = watch::channel(true);
        Self {
            visible: Arc::new(visible),
            timer: None,
        }
    }

    /// Start the close timer. Later calls do nothing.
    pub fn start(&mut self, delay: Duration) {
        if self.timer.is_some() || !self.is_visible() {
            return;
        }
        let visible = Arc::clone(&self.visible);
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            hide(&visible);
        }));
    }

    /// Hide the gate now and stop the timer.
    pub fn close(&mut self) {
        if let Some(timer) = &self.timer {
            timer.abort();
        }
        hide(&self.visible);
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }
}

fn hide(visible: &watch::Sender<bool>) {
    let closed = visible.send_if_modified(|shown| std::mem::replace(shown, false));
    if closed {
        tracing::debug!("Splash closed");
    }
}

impl Drop for SplashGate {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
