//! Pluggable device backend.
//!
//! The rig only ever talks to a [`DeviceBackend`]: it enumerates devices as
//! `{id, label}` pairs, opens a capture stream that feeds mono blocks into a
//! channel, and opens a playback stream driven by a render callback.
//!
//! ```text
//!   input device ──► open_input ──► InputSender ──► line-in feed
//!                                                        │
//!                                                   AudioContext
//!                                                        │
//!   output device ◄── open_output ◄── RenderCallback ◄───┘
//! ```
//!
//! Stream handles are type-erased and stop their stream on drop, which keeps
//! platform types out of the rig.

use crate::Result;
use crossbeam_channel::Sender;

/// Which side of the interface a device sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Capture device.
    Input,
    /// Playback device.
    Output,
}

impl DeviceKind {
    /// Lowercase name, used in device ids.
    pub fn name(self) -> &'static str {
        match self {
            DeviceKind::Input => "input",
            DeviceKind::Output => "output",
        }
    }
}

/// A device as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Backend-specific identifier, stable for one enumeration.
    pub id: String,
    /// Human-readable label; lookups match on this.
    pub label: String,
    /// Capture or playback.
    pub kind: DeviceKind,
}

impl DeviceInfo {
    /// Create a device entry.
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }
}

/// Find a device of `kind` by label.
///
/// An exact match wins; otherwise the first case-insensitive substring match
/// is returned.
pub fn find_device_by_label<'a>(
    devices: &'a [DeviceInfo],
    label: &str,
    kind: DeviceKind,
) -> Option<&'a DeviceInfo> {
    let mut candidates = devices.iter().filter(|d| d.kind == kind);
    if let Some(exact) = candidates.clone().find(|d| d.label == label) {
        return Some(exact);
    }
    let needle = label.to_lowercase();
    candidates.find(|d| d.label.to_lowercase().contains(&needle))
}

/// Stream settings requested from a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
        }
    }
}

/// Type-erased stream handle. Dropping it stops the stream.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, kept alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Receives captured audio as mono blocks.
pub type InputSender = Sender<Vec<f32>>;

/// Fills one block of mono output on the audio thread.
///
/// Runs in real time: no blocking I/O.
pub type RenderCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Device enumeration and stream construction.
///
/// Object-safe and shareable across threads so the input stream can be
/// opened off the control thread.
pub trait DeviceBackend: Send + Sync {
    /// Backend name, e.g. `"cpal"`.
    fn name(&self) -> &str;

    /// Every input and output device.
    fn list_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Open a capture stream on the device labelled `device`, or the default.
    ///
    /// Captured audio is mixed to mono and sent block by block; blocks are
    /// dropped when the channel is full.
    fn open_input(
        &self,
        device: Option<&str>,
        config: &StreamConfig,
        sender: InputSender,
    ) -> Result<StreamHandle>;

    /// Open a playback stream on the device labelled `device`, or the default.
    ///
    /// `render` fills mono frames, which are copied to every output channel.
    fn open_output(
        &self,
        device: Option<&str>,
        config: &StreamConfig,
        render: RenderCallback,
    ) -> Result<StreamHandle>;
}
