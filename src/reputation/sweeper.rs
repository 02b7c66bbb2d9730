use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use super::cache::ReputationCache;

/// Runs [`ReputationCache::sweep`] every `interval` on a dedicated thread.
///
/// The thread stops when the handle is stopped or dropped.
pub fn spawn_sweeper(cache: Arc<ReputationCache>, interval: Duration) -> io::Result<SweeperHandle> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let thread = thread::Builder::new()
        .name("reputation-sweeper".to_string())
        .spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let removed = cache.sweep();
                        if removed > 0 {
                            debug!(removed, "expired reputation entries swept");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })?;
    Ok(SweeperHandle {
        stop: Some(stop_tx),
        thread: Some(thread),
    })
}

pub struct SweeperHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
