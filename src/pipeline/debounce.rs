//! Per-document debounce scheduler.
//!
//! [`Debouncer::schedule`] starts a timer for a document id and replaces any
//! timer still pending for the same id. When a timer expires it first removes
//! itself from the pending set and only then runs its job, so a later
//! `schedule` or `cancel` can abort a waiting timer but never a job that is
//! already running.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;

use crate::store::DocumentId;

struct PendingTimer {
    ticket: u64,
    handle: AbortHandle,
}

type PendingMap = Arc<Mutex<HashMap<DocumentId, PendingTimer>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// At most one pending timer per document id.
pub struct Debouncer {
    window: Duration,
    pending: PendingMap,
    next_ticket: AtomicU64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Run `job` once `window` has passed without another `schedule` for
    /// `id`. Must be called within a tokio runtime.
    pub fn schedule<F>(&self, id: DocumentId, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let window = self.window;
        let pending = Arc::clone(&self.pending);

        // Held across the spawn so the timer cannot look itself up before
        // it has been registered.
        let mut timers = lock(&self.pending);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            {
                let mut timers = lock(&pending);
                match timers.get(&id) {
                    Some(timer) if timer.ticket == ticket => {
                        timers.remove(&id);
                    }
                    _ => return,
                }
            }
            log::debug!("pipeline: debounce fired for {id}");
            job.await;
        });

        let replaced = timers.insert(
            id,
            PendingTimer {
                ticket,
                handle: handle.abort_handle(),
            },
        );
        if let Some(previous) = replaced {
            previous.handle.abort();
            log::debug!("pipeline: superseded pending refresh for {id}");
        }
    }

    /// Abort the pending timer for `id`. Returns `false` if none was waiting.
    pub fn cancel(&self, id: DocumentId) -> bool {
        match lock(&self.pending).remove(&id) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, id: DocumentId) -> bool {
        lock(&self.pending).contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Instant};

    type Log = Arc<Mutex<Vec<(&'static str, Duration)>>>;

    fn record(log: &Log, start: Instant, label: &'static str) -> impl Future<Output = ()> + Send + 'static {
        let log = Arc::clone(log);
        async move {
            log.lock().unwrap().push((label, start.elapsed()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn coalesces_rapid_schedules_into_last() {
        let debouncer = Debouncer::new(Duration::from_millis(1000));
        let id = DocumentId::new();
        let log: Log = Arc::default();
        let start = Instant::now();

        debouncer.schedule(id, record(&log, start, "t0"));
        sleep(Duration::from_millis(200)).await;
        debouncer.schedule(id, record(&log, start, "t200"));
        sleep(Duration::from_millis(200)).await;
        debouncer.schedule(id, record(&log, start, "t400"));

        sleep(Duration::from_millis(3000)).await;

        let fired = log.lock().unwrap().clone();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, "t400");
        assert_eq!(fired[0].1, Duration::from_millis(1400));
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ids_are_debounced_independently() {
        let debouncer = Debouncer::new(Duration::from_millis(1000));
        let (a, b) = (DocumentId::new(), DocumentId::new());
        let log: Log = Arc::default();
        let start = Instant::now();

        debouncer.schedule(a, record(&log, start, "a"));
        sleep(Duration::from_millis(500)).await;
        debouncer.schedule(b, record(&log, start, "b"));
        assert_eq!(debouncer.pending_count(), 2);

        sleep(Duration::from_millis(2000)).await;

        let fired = log.lock().unwrap().clone();
        assert_eq!(
            fired,
            vec![
                ("a", Duration::from_millis(1000)),
                ("b", Duration::from_millis(1500)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let debouncer = Debouncer::new(Duration::from_millis(1000));
        let id = DocumentId::new();
        let log: Log = Arc::default();

        debouncer.schedule(id, record(&log, Instant::now(), "never"));
        assert!(debouncer.is_pending(id));
        assert!(debouncer.cancel(id));
        assert!(!debouncer.cancel(id));

        sleep(Duration::from_millis(2000)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn running_job_is_not_aborted_by_new_schedule() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let id = DocumentId::new();
        let log: Log = Arc::default();
        let start = Instant::now();

        let slow = {
            let log = Arc::clone(&log);
            async move {
                sleep(Duration::from_millis(500)).await;
                log.lock().unwrap().push(("slow", start.elapsed()));
            }
        };
        debouncer.schedule(id, slow);

        // Timer fired at 100ms; the job is now running.
        sleep(Duration::from_millis(150)).await;
        assert!(!debouncer.is_pending(id));
        debouncer.schedule(id, record(&log, start, "next"));

        sleep(Duration::from_millis(1000)).await;
        let labels: Vec<_> = log.lock().unwrap().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["next", "slow"]);
    }
}
