//! Deferred teardown action that runs exactly once.

use std::{fmt, thread, time::Duration};

use tracing::debug;

/// Delay between teardown and the deferred action.
pub const DEFAULT_TEARDOWN_DELAY: Duration = Duration::from_millis(500);

type Action = Box<dyn FnOnce() + Send>;

/// An action armed at construction and fired once: by [`run`](Self::run),
/// or on drop if it was never run or cancelled.
pub struct DeferredAction {
    delay: Duration,
    action: Option<Action>,
}

impl DeferredAction {
    pub fn new(delay: Duration, action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            delay,
            action: Some(Box::new(action)),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.action.is_some()
    }

    /// Sleep for the configured delay and run the action; later calls do nothing.
    pub fn run(&mut self) {
        if let Some(action) = self.action.take() {
            debug!(
                target: "paretrace_fastforward::lifecycle",
                delay_ms = self.delay.as_millis() as u64,
                "Running teardown action"
            );
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            action();
        }
    }

    /// Disarm without running.
    pub fn cancel(&mut self) {
        if self.action.take().is_some() {
            debug!(
                target: "paretrace_fastforward::lifecycle",
                "Cancelled teardown action"
            );
        }
    }
}

impl Drop for DeferredAction {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for DeferredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredAction")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}
