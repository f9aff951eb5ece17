//! Single-flight input acquisition.
//!
//! Opening a capture device can block for a long time (permission prompts,
//! driver start-up), so [`InputAcquirer`] opens it on a background thread.
//! An atomic latch keeps at most one open in flight. It stays set until the
//! control thread has taken the outcome with [`InputAcquirer::poll`] or
//! [`InputAcquirer::wait`].

use crate::Result;
use crate::backend::{DeviceBackend, InputSender, StreamConfig, StreamHandle};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Outcome of one input open.
#[derive(Debug)]
pub struct InputOpened {
    /// Label that was requested; `None` means the default device.
    pub device: Option<String>,
    /// The live stream, or why it could not be opened.
    pub result: Result<StreamHandle>,
}

/// Opens input streams off the control thread, one at a time.
#[derive(Debug)]
pub struct InputAcquirer {
    in_flight: Arc<AtomicBool>,
    tx: Sender<InputOpened>,
    rx: Receiver<InputOpened>,
}

impl Default for InputAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

impl InputAcquirer {
    /// Idle acquirer.
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            in_flight: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    /// Whether an open is running or its outcome has not been taken yet.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start opening `device` in the background.
    ///
    /// Returns `false` without doing anything while another open is in
    /// flight.
    pub fn request(
        &self,
        backend: Arc<dyn DeviceBackend>,
        device: Option<String>,
        config: StreamConfig,
        sender: InputSender,
    ) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("input open already in flight");
            return false;
        }

        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name("input-open".to_string())
            .spawn(move || {
                let result = backend.open_input(device.as_deref(), &config, sender);
                let _ = tx.send(InputOpened { device, result });
            });

        if let Err(err) = spawned {
            self.in_flight.store(false, Ordering::Release);
            tracing::warn!(error = %err, "failed to spawn input open thread");
            return false;
        }
        true
    }

    /// Outcome of a finished open, if one is waiting.
    pub fn poll(&self) -> Option<InputOpened> {
        self.rx.try_recv().ok().inspect(|_| self.release())
    }

    /// Block up to `timeout` for the outcome of an open.
    pub fn wait(&self, timeout: Duration) -> Option<InputOpened> {
        self.rx.recv_timeout(timeout).ok().inspect(|_| self.release())
    }

    fn release(&self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
