use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::sync::Notify;

/// Running flag cleared by Ctrl+C
///
/// Async loops can wait on [`ShutdownSignal::stopped`] instead of polling the flag.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    running: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    /// Flag that starts out running and is not wired to any signal
    pub fn new() -> Self {
        Self { running: Arc::new(AtomicBool::new(true)), notify: Arc::new(Notify::new()) }
    }

    /// Install a process-wide Ctrl+C handler that clears the flag
    ///
    /// Can only be called once per process; later calls fail with
    /// [`ctrlc::Error::MultipleHandlers`].
    pub fn install() -> Result<Self, ctrlc::Error> {
        let signal = Self::new();
        let handler = signal.clone();
        ctrlc::set_handler(move || {
            tracing::info!("Shutdown signal received");
            handler.trigger();
        })?;
        Ok(signal)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request shutdown and wake every task parked in [`ShutdownSignal::stopped`]
    pub fn trigger(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Resolve once shutdown has been requested
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // register before reading the flag so a trigger in between still wakes us
            notified.as_mut().enable();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
