//! Cooperative shutdown flag with an interruptible wait.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};

/// Cloneable stop request shared between the signal handler and the loop.
///
/// `trigger` is safe to call from any thread, any number of times. The loop
/// checks `is_triggered` between iterations; rest intervals use `wait_for`
/// so a request ends them immediately.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    pub fn trigger(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            // wake a sleeper; a full channel means one is already queued
            let _ = self.tx.try_send(());
        }
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Block for up to `timeout`. Returns `true` if shutdown was requested
    /// before or during the wait.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                // put the wake token back for other waiters
                let _ = self.tx.try_send(());
                true
            }
            Err(RecvTimeoutError::Timeout) => self.is_triggered(),
            Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}
