#[cfg(test)]
#[path = "debounce_test.rs"]
mod tests;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

/// Single-owner handle to at most one scheduled delivery. Arming replaces
/// (and aborts) whatever was scheduled before, and dropping the debouncer
/// aborts anything still pending.
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Debouncer {
        return Debouncer {
            delay,
            pending: None,
        };
    }

    /// Delivers `value` on `tx` once `delay` passes without another call to
    /// `arm` or `cancel`.
    pub fn arm<T: Send + 'static>(&mut self, tx: &mpsc::UnboundedSender<T>, value: T) {
        self.cancel();

        let tx = tx.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            if tx.send(value).is_err() {
                tracing::debug!("Debounce receiver dropped before delivery");
            }
        }));
    }

    /// Returns true when a scheduled delivery was still waiting.
    pub fn cancel(&mut self) -> bool {
        if let Some(handle) = self.pending.take() {
            let was_pending = !handle.is_finished();
            handle.abort();
            return was_pending;
        }

        return false;
    }

    pub fn is_pending(&self) -> bool {
        return self
            .pending
            .as_ref()
            .map(|e| return !e.is_finished())
            .unwrap_or(false);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
