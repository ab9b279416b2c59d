use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

/// A background thread that periodically runs a caller-supplied tick
/// function (segment flush / compaction) until cancelled. Cancellation is
/// a flag check between ticks, never mid-tick, matching the rest of this
/// crate's cooperative-cancellation model.
pub struct Maintainer {
    cancel: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Maintainer {
    pub fn spawn<F>(interval: Duration, tick: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_in_thread = cancel.clone();
        let handle = thread::spawn(move || {
            while !cancel_in_thread.load(Ordering::Relaxed) {
                tick();
                thread::sleep(interval);
            }
        });
        Maintainer { cancel, handle: Mutex::new(Some(handle)) }
    }

    pub fn try_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn wait(&self) {
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}
