//! Pitch analysis on a dedicated thread.
//!
//! The control side submits one-shot [`PitchRequest`]s and polls for
//! [`PitchResponse`]s tagged with the same id. The worker thread exits when
//! the request channel closes, which happens when the [`PitchWorker`] is
//! dropped.

use crate::pitch::{TunerReading, analyse};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A window of analyser bytes to analyse.
#[derive(Debug, Clone)]
pub struct PitchRequest {
    /// Caller-chosen id echoed in the response.
    pub id: u64,
    /// Time-domain bytes, silence at 128.
    pub samples: Vec<u8>,
    /// Sample rate of `samples`.
    pub sample_rate: f32,
}

/// Result of one [`PitchRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchResponse {
    /// Id of the request this answers.
    pub id: u64,
    /// Detected note, or the silent reading.
    pub reading: TunerReading,
}

/// Handle to the analysis thread.
#[derive(Debug)]
pub struct PitchWorker {
    requests: Option<Sender<PitchRequest>>,
    responses: Receiver<PitchResponse>,
    handle: Option<JoinHandle<()>>,
    next_id: u64,
}

impl PitchWorker {
    /// Start the worker thread.
    pub fn spawn() -> io::Result<Self> {
        let (request_tx, request_rx) = unbounded::<PitchRequest>();
        let (response_tx, response_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("pitch-worker".into())
            .spawn(move || {
                for request in request_rx {
                    let reading = analyse(&request.samples, request.sample_rate);
                    let response = PitchResponse {
                        id: request.id,
                        reading,
                    };
                    if response_tx.send(response).is_err() {
                        break;
                    }
                }
                tracing::debug!("pitch worker stopped");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
            next_id: 1,
        })
    }

    /// Queue a window for analysis and return its request id.
    ///
    /// Returns `None` if the worker thread has gone away.
    pub fn submit(&mut self, samples: Vec<u8>, sample_rate: f32) -> Option<u64> {
        let id = self.next_id;
        self.next_id += 1;
        let request = PitchRequest {
            id,
            samples,
            sample_rate,
        };
        self.requests.as_ref()?.send(request).ok()?;
        Some(id)
    }

    /// Next finished response, if any.
    pub fn try_recv(&self) -> Option<PitchResponse> {
        self.responses.try_recv().ok()
    }

    /// Wait up to `timeout` for the next response.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PitchResponse> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for PitchWorker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("pitch worker panicked");
            }
        }
    }
}
