//! Cancelable periodic autosave task.
//!
//! # Responsibility
//! - Commit pending working-context changes on a fixed interval without
//!   blocking the caller.
//!
//! # Invariants
//! - Each tick independently checks for staged changes; an empty context
//!   means no commit and no notification cycle.
//! - Tick commit failures are logged and do not stop the loop.
//! - The loop stops when signaled, or when the owning store is gone.

use super::{lock_inner, StoreInner};
use log::{debug, error, info};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Mutex, Weak};
use std::thread::JoinHandle;
use std::time::Duration;

/// Owning handle for the autosave thread. Dropping it stops the loop.
pub(crate) struct AutosaveHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl AutosaveHandle {
    /// Spawns the periodic loop. The thread holds only a weak reference to
    /// the store, so an un-stopped loop cannot outlive it.
    pub(crate) fn spawn(store: Weak<Mutex<StoreInner>>, interval: Duration) -> Self {
        let (shutdown, ticks) = mpsc::channel::<()>();
        let thread = std::thread::spawn(move || run_loop(store, interval, &ticks));
        Self {
            shutdown,
            thread: Some(thread),
        }
    }

    /// Signals the loop to stop and waits for the thread to finish.
    /// Idempotent.
    pub(crate) fn stop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(store: Weak<Mutex<StoreInner>>, interval: Duration, ticks: &mpsc::Receiver<()>) {
    info!(
        "event=autosave_start module=store status=ok interval_ms={}",
        interval.as_millis()
    );

    loop {
        match ticks.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let Some(inner) = store.upgrade() else {
            break;
        };
        let mut guard = lock_inner(&inner);

        if guard.context.is_empty() {
            debug!("event=autosave_tick module=store status=ok changes=0");
            continue;
        }

        let staged = guard.context.len();
        match guard.commit() {
            Ok(()) => debug!(
                "event=autosave_tick module=store status=ok changes={}",
                staged
            ),
            Err(err) => error!(
                "event=autosave_tick module=store status=error changes={} error={}",
                staged, err
            ),
        }
    }

    info!("event=autosave_stop module=store status=ok");
}
