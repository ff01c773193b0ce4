//! Deferred suggestion runs.
//!
//! Completors can be slow; running one on every keystroke wastes work while
//! the user is still typing. The runner waits out a configurable delay and
//! executes only the most recent request, delivering the candidate list on a
//! channel the UI polls. A zero delay runs immediately; either way exactly
//! one background execution is in flight per burst of requests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Runs suggestion closures after a quiet period, delivering results on a
/// bounded channel.
pub struct DeferredRunner<T> {
    delay: Duration,
    sender: SyncSender<Vec<T>>,
    receiver: Receiver<Vec<T>>,
    /// Generation counter; a newer request supersedes any sleeping one.
    epoch: Arc<AtomicU64>,
}

impl<T: Send + 'static> DeferredRunner<T> {
    /// Create a runner with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        let (sender, receiver) = sync_channel(1);
        Self {
            delay,
            sender,
            receiver,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Change the quiet period for subsequent runs.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Schedule `producer` after the quiet period; a newer call supersedes
    /// this one if it arrives before the delay elapses.
    pub fn run<F>(&self, producer: F)
    where
        F: FnOnce() -> Vec<T> + Send + 'static,
    {
        if self.delay.is_zero() {
            self.run_now(producer);
            return;
        }
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let shared_epoch = Arc::clone(&self.epoch);
        let sender = self.sender.clone();
        let delay = self.delay;
        thread::spawn(move || {
            thread::sleep(delay);
            if shared_epoch.load(Ordering::SeqCst) != epoch {
                // A newer request took over while this one slept.
                return;
            }
            deliver(&sender, producer());
        });
    }

    /// Execute `producer` immediately on a background thread.
    pub fn run_now<F>(&self, producer: F)
    where
        F: FnOnce() -> Vec<T> + Send + 'static,
    {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let sender = self.sender.clone();
        thread::spawn(move || {
            deliver(&sender, producer());
        });
    }

    /// Take the most recent result, if one arrived.
    pub fn try_recv(&self) -> Option<Vec<T>> {
        let mut latest = None;
        while let Ok(items) = self.receiver.try_recv() {
            latest = Some(items);
        }
        latest
    }
}

fn deliver<T>(sender: &SyncSender<Vec<T>>, items: Vec<T>) {
    match sender.try_send(items) {
        Ok(()) => {}
        Err(TrySendError::Full(items)) => {
            // The UI has not polled yet; the stale result is worthless.
            log::debug!("dropping stale completion result ({} items)", items.len());
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
}
