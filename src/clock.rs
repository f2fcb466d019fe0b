use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::time_provider::{TimeProvider, TimeSample, next_tick_delay};

#[derive(Clone)]
pub struct ClockSource {
    provider: Arc<dyn TimeProvider>,
}

impl ClockSource {
    pub fn new(provider: Arc<dyn TimeProvider>) -> Self {
        Self { provider }
    }

    pub fn now(&self) -> TimeSample {
        self.provider.now()
    }

    pub fn provider(&self) -> Arc<dyn TimeProvider> {
        Arc::clone(&self.provider)
    }

    pub fn start<F>(&self, mut on_tick: F) -> io::Result<TickHandle>
    where
        F: FnMut(TimeSample) + Send + 'static,
    {
        let provider = Arc::clone(&self.provider);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let worker = thread::Builder::new()
            .name("betterwatch-tick".to_string())
            .spawn(move || {
                debug!(source = provider.label(), "tick thread started");
                loop {
                    let delay = next_tick_delay(&provider.now());
                    match stop_rx.recv_timeout(delay) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    on_tick(provider.now());
                }
                debug!("tick thread exiting");
            })?;
        info!(source = self.provider.label(), "clock ticking");
        Ok(TickHandle {
            stop_tx: Some(stop_tx),
            worker: Some(worker),
        })
    }
}

// Must not be cancelled from inside the tick callback, and the caller must
// not hold a lock the callback takes while cancelling.
pub struct TickHandle {
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// Stops the timer. Once this returns no further tick is delivered.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            info!("clock stopped");
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
