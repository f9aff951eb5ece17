//! Deterministic backend for tests.
//!
//! [`MockBackend`] opens no hardware. Captured audio is pushed by hand with
//! [`MockBackend::feed`], and the output callback is driven with
//! [`MockBackend::pull`]. Streams stay live until their handle is dropped.

use crate::backend::{
    DeviceBackend, DeviceInfo, DeviceKind, InputSender, RenderCallback, StreamConfig, StreamHandle,
    find_device_by_label,
};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Clears its flag when the stream handle is dropped.
struct Live(Arc<AtomicBool>);

impl Drop for Live {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Default)]
struct MockState {
    opened_inputs: Vec<Option<String>>,
    opened_outputs: Vec<Option<String>>,
    input: Option<(Arc<AtomicBool>, InputSender)>,
    output: Option<(Arc<AtomicBool>, RenderCallback)>,
}

/// Backend with scripted devices and hand-driven streams.
pub struct MockBackend {
    devices: Vec<DeviceInfo>,
    open_delay: Duration,
    deny_input: bool,
    state: Mutex<MockState>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// One input labelled `Mock Input` and one output labelled `Mock Output`.
    pub fn new() -> Self {
        Self::with_devices(vec![
            DeviceInfo::new("input-0", "Mock Input", DeviceKind::Input),
            DeviceInfo::new("output-0", "Mock Output", DeviceKind::Output),
        ])
    }

    /// Backend exposing exactly `devices`.
    pub fn with_devices(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices,
            open_delay: Duration::ZERO,
            deny_input: false,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Sleep this long inside every input open.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// Refuse every input open with [`Error::PermissionDenied`].
    pub fn deny_input(mut self) -> Self {
        self.deny_input = true;
        self
    }

    /// Labels of every input open that succeeded, in order.
    pub fn opened_inputs(&self) -> Vec<Option<String>> {
        self.state.lock().opened_inputs.clone()
    }

    /// Labels of every output open that succeeded, in order.
    pub fn opened_outputs(&self) -> Vec<Option<String>> {
        self.state.lock().opened_outputs.clone()
    }

    /// Whether the most recent input stream is still open.
    pub fn input_live(&self) -> bool {
        self.state
            .lock()
            .input
            .as_ref()
            .is_some_and(|(live, _)| live.load(Ordering::Acquire))
    }

    /// Whether the most recent output stream is still open.
    pub fn output_live(&self) -> bool {
        self.state
            .lock()
            .output
            .as_ref()
            .is_some_and(|(live, _)| live.load(Ordering::Acquire))
    }

    /// Deliver `block` as captured audio. `false` without a live input.
    pub fn feed(&self, block: Vec<f32>) -> bool {
        let state = self.state.lock();
        match &state.input {
            Some((live, sender)) if live.load(Ordering::Acquire) => sender.try_send(block).is_ok(),
            _ => false,
        }
    }

    /// Run the output callback for `frames` frames. `None` without a live
    /// output.
    pub fn pull(&self, frames: usize) -> Option<Vec<f32>> {
        let mut state = self.state.lock();
        let (live, render) = state.output.as_mut()?;
        if !live.load(Ordering::Acquire) {
            return None;
        }
        let mut block = vec![0.0; frames];
        render(&mut block);
        Some(block)
    }

    fn check(&self, device: Option<&str>, kind: DeviceKind) -> Result<()> {
        match device {
            Some(label) if find_device_by_label(&self.devices, label, kind).is_none() => {
                Err(Error::DeviceNotFound(label.to_string()))
            }
            None if !self.devices.iter().any(|d| d.kind == kind) => Err(Error::NoDevice),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("devices", &self.devices)
            .field("open_delay", &self.open_delay)
            .field("deny_input", &self.deny_input)
            .finish_non_exhaustive()
    }
}

impl DeviceBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.devices.clone())
    }

    fn open_input(
        &self,
        device: Option<&str>,
        _config: &StreamConfig,
        sender: InputSender,
    ) -> Result<StreamHandle> {
        if !self.open_delay.is_zero() {
            std::thread::sleep(self.open_delay);
        }
        if self.deny_input {
            return Err(Error::PermissionDenied("input refused".to_string()));
        }
        self.check(device, DeviceKind::Input)?;

        let live = Arc::new(AtomicBool::new(true));
        let mut state = self.state.lock();
        state.opened_inputs.push(device.map(str::to_string));
        state.input = Some((Arc::clone(&live), sender));
        Ok(StreamHandle::new(Live(live)))
    }

    fn open_output(
        &self,
        device: Option<&str>,
        _config: &StreamConfig,
        render: RenderCallback,
    ) -> Result<StreamHandle> {
        self.check(device, DeviceKind::Output)?;

        let live = Arc::new(AtomicBool::new(true));
        let mut state = self.state.lock();
        state.opened_outputs.push(device.map(str::to_string));
        state.output = Some((Arc::clone(&live), render));
        Ok(StreamHandle::new(Live(live)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_runs_until_dropped() {
        let backend = MockBackend::new();
        let handle = backend
            .open_output(
                None,
                &StreamConfig::default(),
                Box::new(|block: &mut [f32]| block.fill(0.5)),
            )
            .unwrap();
        assert_eq!(backend.pull(4), Some(vec![0.5; 4]));
        drop(handle);
        assert!(!backend.output_live());
        assert_eq!(backend.pull(4), None);
    }

    #[test]
    fn feed_reaches_sender() {
        let backend = MockBackend::new();
        let (tx, rx) = crossbeam_channel::bounded(2);
        let _handle = backend
            .open_input(Some("mock input"), &StreamConfig::default(), tx)
            .unwrap();
        assert!(backend.feed(vec![0.25; 8]));
        assert_eq!(rx.try_recv().unwrap(), vec![0.25; 8]);
        assert_eq!(backend.opened_inputs(), vec![Some("mock input".to_string())]);
    }

    #[test]
    fn unknown_label_is_not_found() {
        let backend = MockBackend::new();
        let err = backend
            .open_output(
                Some("Studio Monitors"),
                &StreamConfig::default(),
                Box::new(|_: &mut [f32]| {}),
            )
            .unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(_)));
        assert!(backend.opened_outputs().is_empty());
    }
}
