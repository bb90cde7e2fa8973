//! Debouncing: only a value that stayed unchanged for the whole quiet period
//! propagates; everything typed in between is dropped.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Timer-restarting debouncer driven from an event loop.
///
/// `push` (re)arms the timer; the loop sleeps until [`deadline`](Self::deadline)
/// and collects the settled value with [`take_due`](Self::take_due). Nothing
/// runs in the background, so dropping the debouncer drops the pending value.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the quiet period.
    pub fn push(&mut self, value: T) {
        self.pending = Some(Pending {
            value,
            deadline: Instant::now() + self.delay,
        });
    }

    /// Disarm the timer, returning the value that will now never settle.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// The pending value if its quiet period is over at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(p) if p.deadline <= now => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Wait for the pending value to settle. `None` if nothing is pending.
    ///
    /// Cancel safe: dropping the future keeps the pending value armed.
    pub async fn settled(&mut self) -> Option<T> {
        let deadline = self.deadline()?;
        tokio::time::sleep_until(deadline).await;
        self.take_due(Instant::now())
    }
}

/// Derive a debounced cell from `source`.
///
/// The returned receiver starts with the source's current value and afterwards
/// only sees values that stayed put for `delay`. The background task ends when
/// the source sender or every returned receiver is dropped; a value still
/// pending at that point is discarded.
pub fn debounce_watch<T>(mut source: watch::Receiver<T>, delay: Duration) -> watch::Receiver<T>
where
    T: Clone + Send + Sync + 'static,
{
    let initial = source.borrow_and_update().clone();
    let (tx, rx) = watch::channel(initial);

    tokio::spawn(async move {
        let mut debouncer = Debouncer::new(delay);
        loop {
            let deadline = debouncer.deadline();
            tokio::select! {
                changed = source.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let value = source.borrow_and_update().clone();
                    debouncer.push(value);
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() =>
                {
                    if let Some(value) = debouncer.take_due(Instant::now()) {
                        if tx.send(value).is_err() {
                            break;
                        }
                    }
                }
                _ = tx.closed() => break,
            }
        }
    });

    rx
}
