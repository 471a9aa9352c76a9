use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, RwLock,
    },
    time::Duration,
};

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::error::Fault;
use crate::platform::{Connector, PlayerHandle, ProcessProbe};

/// The player handle together with what is known about the player process.
pub struct Liveness {
    process_name: String,
    probe: Arc<dyn ProcessProbe>,
    connector: Arc<dyn Connector>,
    handle: RwLock<Option<Arc<dyn PlayerHandle>>>,
    running: AtomicBool,
}

impl Liveness {
    pub fn new(
        process_name: impl Into<String>,
        probe: Arc<dyn ProcessProbe>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            process_name: process_name.into(),
            probe,
            connector,
            handle: RwLock::new(None),
            running: AtomicBool::new(false),
        }
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Replaces the current handle with a freshly acquired one.
    pub fn acquire(&self) -> Result<(), Fault> {
        let handle = self.connector.connect()?;
        *self.handle.write().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        info!("Connected to {}", self.process_name);
        Ok(())
    }

    /// The handle to call into; the slot lock is not held during the call.
    pub fn handle(&self) -> Result<Arc<dyn PlayerHandle>, Fault> {
        self.handle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Fault::NotStarted)
    }

    pub fn is_process_running(&self) -> bool {
        self.probe.is_running(&self.process_name)
    }

    /// Process state as of the last tick.
    pub fn last_seen_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Records whether the process runs right now, without reconnecting.
    pub fn observe(&self) -> bool {
        let running = self.is_process_running();
        self.running.store(running, Ordering::Release);
        running
    }

    /// One liveness tick.
    ///
    /// Reconnects only when the process went from absent to present. The
    /// observation is recorded even if reconnecting fails, so a failed
    /// reconnect waits for the player to restart.
    pub fn poll_once(&self) -> Result<(), Fault> {
        let running = self.is_process_running();
        let was_running = self.running.swap(running, Ordering::AcqRel);
        if running && !was_running {
            debug!("{} started", self.process_name);
            self.acquire()?;
        } else if !running && was_running {
            debug!("{} exited", self.process_name);
        }
        Ok(())
    }
}

/// Runs [`Liveness::poll_once`] on a fixed interval. A tick's work finishes
/// before the next tick is awaited, so ticks never overlap.
pub struct Monitor {
    liveness: Arc<Liveness>,
    interval: Duration,
    runtime: Handle,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Monitor {
    pub fn new(liveness: Arc<Liveness>, interval: Duration, runtime: Handle) -> Self {
        Self {
            liveness,
            interval,
            runtime,
            task: Mutex::new(None),
        }
    }

    /// Acquires a handle regardless of the process state, then starts ticking.
    ///
    /// The process state is recorded first, so a player that is already
    /// running counts as seen and the first tick does not reconnect.
    pub fn start(&self) -> Result<(), Fault> {
        self.liveness.observe();
        self.liveness.acquire()?;

        let liveness = Arc::clone(&self.liveness);
        let interval = self.interval;
        let task = self.runtime.spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let tick_liveness = Arc::clone(&liveness);
                match tokio::task::spawn_blocking(move || tick_liveness.poll_once()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!("Failed to reconnect to {}: {e}", liveness.process_name());
                    }
                    Err(e) => {
                        error!("Liveness check for {} died: {e}", liveness.process_name());
                        break;
                    }
                }
            }
        });

        let previous = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
        Ok(())
    }

    pub fn stop(&self) {
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}
