//! Audio I/O for the stomp guitar rig.
//!
//! This crate provides:
//!
//! - **Devices**: the [`DeviceBackend`] trait, its cpal implementation
//!   [`CpalBackend`], and [`find_device_by_label`] for label lookup
//! - **Input acquisition**: [`InputAcquirer`], a single-flight latch that opens
//!   the input stream off the control thread
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for offline rendering
//! - **Testing**: [`MockBackend`], a deterministic backend driven by hand
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stomp_io::{CpalBackend, DeviceBackend, DeviceKind, find_device_by_label};
//!
//! let backend = CpalBackend::new();
//! let devices = backend.list_devices()?;
//! if let Some(input) = find_device_by_label(&devices, "USB Audio", DeviceKind::Input) {
//!     println!("{} -> {}", input.id, input.label);
//! }
//! ```

pub mod acquire;
pub mod backend;
pub mod cpal_backend;
pub mod mock;
mod wav;

pub use acquire::{InputAcquirer, InputOpened};
pub use backend::{
    DeviceBackend, DeviceInfo, DeviceKind, InputSender, RenderCallback, StreamConfig,
    StreamHandle, find_device_by_label,
};
pub use cpal_backend::CpalBackend;
pub use mock::MockBackend;
pub use wav::{WavSpec, read_wav, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The platform refused access to the device.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify a backend failure message.
    ///
    /// Messages mentioning a refused permission become
    /// [`Error::PermissionDenied`]; everything else is [`Error::Stream`].
    pub fn stream(message: impl std::fmt::Display) -> Self {
        let message = message.to_string();
        let lower = message.to_lowercase();
        if lower.contains("permission") || lower.contains("access denied") {
            Error::PermissionDenied(message)
        } else {
            Error::Stream(message)
        }
    }
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_errors_are_classified() {
        assert!(matches!(
            Error::stream("Permission denied by the system"),
            Error::PermissionDenied(_)
        ));
        assert!(matches!(Error::stream("ALSA xrun"), Error::Stream(_)));
        assert_eq!(
            Error::DeviceNotFound("Scarlett".into()).to_string(),
            "Device not found: Scarlett"
        );
    }
}
