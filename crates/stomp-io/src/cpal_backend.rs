//! cpal-based device backend.
//!
//! [`CpalBackend`] wraps [cpal](https://crates.io/crates/cpal) for
//! cross-platform audio: ALSA on Linux, CoreAudio on macOS, WASAPI on Windows.
//! Device ids are `input-N` / `output-N`, the position in cpal's enumeration.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stomp_io::{CpalBackend, DeviceBackend, StreamConfig};
//!
//! let backend = CpalBackend::new();
//! let stream = backend.open_output(
//!     None,
//!     &StreamConfig::default(),
//!     Box::new(|block: &mut [f32]| block.fill(0.0)),
//! )?;
//! // Plays until `stream` is dropped.
//! ```

use crate::backend::{
    DeviceBackend, DeviceInfo, DeviceKind, InputSender, RenderCallback, StreamConfig, StreamHandle,
};
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, HostId};

/// Extract the device label via `description()` (cpal 0.17+).
fn device_label(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// cpal device backend.
///
/// Holds only the host id; the host is reopened per call so the backend can
/// be shared with the input-open thread.
#[derive(Debug, Clone, Copy)]
pub struct CpalBackend {
    host_id: HostId,
}

impl CpalBackend {
    /// Backend on the platform's default audio host.
    pub fn new() -> Self {
        let host_id = cpal::default_host().id();
        tracing::info!(host = host_id.name(), "cpal backend initialized");
        Self { host_id }
    }

    fn host(&self) -> Result<Host> {
        cpal::host_from_id(self.host_id).map_err(Error::stream)
    }

    fn find_device(&self, label: Option<&str>, kind: DeviceKind) -> Result<Device> {
        let host = self.host()?;
        let Some(search) = label else {
            let default = match kind {
                DeviceKind::Input => host.default_input_device(),
                DeviceKind::Output => host.default_output_device(),
            };
            return default.ok_or(Error::NoDevice);
        };

        let devices: Vec<Device> = match kind {
            DeviceKind::Input => host.input_devices().map_err(Error::stream)?.collect(),
            DeviceKind::Output => host.output_devices().map_err(Error::stream)?.collect(),
        };
        let labelled: Vec<(String, Device)> = devices
            .into_iter()
            .filter_map(|d| device_label(&d).ok().map(|name| (name, d)))
            .collect();

        let needle = search.to_lowercase();
        let index = labelled
            .iter()
            .position(|(name, _)| name == search)
            .or_else(|| {
                labelled
                    .iter()
                    .position(|(name, _)| name.to_lowercase().contains(&needle))
            });
        index
            .and_then(|i| labelled.into_iter().nth(i))
            .map(|(_, device)| device)
            .ok_or_else(|| {
                Error::DeviceNotFound(format!("no {} device matching '{}'", kind.name(), search))
            })
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn stream_config(channels: u16, config: &StreamConfig) -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels,
        sample_rate: config.sample_rate,
        buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
    }
}

impl DeviceBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let host = self.host()?;
        let mut devices = Vec::new();

        if let Ok(inputs) = host.input_devices() {
            for (i, device) in inputs.enumerate() {
                if let Ok(label) = device_label(&device) {
                    devices.push(DeviceInfo::new(format!("input-{i}"), label, DeviceKind::Input));
                }
            }
        }
        if let Ok(outputs) = host.output_devices() {
            for (i, device) in outputs.enumerate() {
                if let Ok(label) = device_label(&device) {
                    devices.push(DeviceInfo::new(
                        format!("output-{i}"),
                        label,
                        DeviceKind::Output,
                    ));
                }
            }
        }

        tracing::debug!(count = devices.len(), "devices enumerated");
        Ok(devices)
    }

    fn open_input(
        &self,
        device: Option<&str>,
        config: &StreamConfig,
        sender: InputSender,
    ) -> Result<StreamHandle> {
        let device = self.find_device(device, DeviceKind::Input)?;
        let channels = device
            .default_input_config()
            .map_err(Error::stream)?
            .channels()
            .max(1);
        let channel_count = usize::from(channels);

        let stream = device
            .build_input_stream(
                &stream_config(channels, config),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let block: Vec<f32> = data
                        .chunks(channel_count)
                        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                        .collect();
                    let _ = sender.try_send(block);
                },
                |err| tracing::warn!(error = %err, "input stream error"),
                None,
            )
            .map_err(Error::stream)?;

        stream.play().map_err(Error::stream)?;
        tracing::info!(
            channels,
            sample_rate = config.sample_rate,
            "input stream started"
        );
        Ok(StreamHandle::new(stream))
    }

    fn open_output(
        &self,
        device: Option<&str>,
        config: &StreamConfig,
        mut render: RenderCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_device(device, DeviceKind::Output)?;
        let channels = device
            .default_output_config()
            .map_err(Error::stream)?
            .channels()
            .max(1);
        let channel_count = usize::from(channels);
        let mut mono = vec![0.0f32; config.buffer_size as usize];

        let stream = device
            .build_output_stream(
                &stream_config(channels, config),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channel_count;
                    mono.resize(frames, 0.0);
                    render(&mut mono);
                    for (frame, &sample) in data.chunks_mut(channel_count).zip(mono.iter()) {
                        frame.fill(sample);
                    }
                },
                |err| tracing::warn!(error = %err, "output stream error"),
                None,
            )
            .map_err(Error::stream)?;

        stream.play().map_err(Error::stream)?;
        tracing::info!(
            channels,
            sample_rate = config.sample_rate,
            "output stream started"
        );
        Ok(StreamHandle::new(stream))
    }
}
