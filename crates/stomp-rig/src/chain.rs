//! The chain orchestrator.
//!
//! [`ChainManager`] owns the line-in source, the master sink and the ordered
//! pedal list, and keeps the graph matching the list. Every structural change
//! runs the same rebuild: disconnect the source and every pedal output, mutate
//! the list, reconnect end to end.
//!
//! ```text
//!   line-in ──► pedal[0] ──► pedal[1] ──► … ──► cabinet ──► sink (master) ──► destination
//!   line-in ─────────────────────────────────────────────► sink              (empty chain)
//! ```
//!
//! A terminal effect (the cabinet) is always last.

use crate::error::{Result, RigError};
use crate::feed::{RenderFeed, line_in_channel};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use stomp_config::{MASTER_PARAM, Preset, validate_preset};
use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{AudioContext, Effect, EffectId, EffectSnapshot, clamp};
use stomp_effects::Pedal;
use stomp_io::{
    DeviceBackend, InputAcquirer, InputOpened, InputSender, StreamConfig, StreamHandle,
};
use stomp_registry::EffectRegistry;

/// An open device stream and the label it was opened with.
struct ActiveStream {
    device: Option<String>,
    _stream: StreamHandle,
    /// Render gate of an output stream's feed.
    enabled: Option<Arc<AtomicBool>>,
}

/// Owns the pedal chain and its routing.
pub struct ChainManager {
    ctx: AudioContext,
    sink: NodeId,
    effects: Vec<Pedal>,
    master: f32,
    stream_config: StreamConfig,
    line_in_tx: InputSender,
    line_in_rx: Receiver<Vec<f32>>,
    acquirer: InputAcquirer,
    input: Option<ActiveStream>,
    output: Option<ActiveStream>,
}

impl ChainManager {
    /// Empty chain on `ctx`: line-in straight into the master sink.
    pub fn new(ctx: &AudioContext) -> Self {
        let sink = ctx.create_gain(1.0);
        ctx.connect(sink, ctx.destination());
        ctx.connect(ctx.line_in(), sink);
        let (line_in_tx, line_in_rx) = line_in_channel();

        Self {
            ctx: ctx.clone(),
            sink,
            effects: Vec::new(),
            master: 1.0,
            stream_config: StreamConfig {
                sample_rate: ctx.sample_rate() as u32,
                ..StreamConfig::default()
            },
            line_in_tx,
            line_in_rx,
            acquirer: InputAcquirer::new(),
            input: None,
            output: None,
        }
    }

    /// Use `buffer_size` frames for device streams opened from now on.
    pub fn with_buffer_size(mut self, buffer_size: u32) -> Self {
        self.stream_config.buffer_size = buffer_size;
        self
    }

    /// The graph this chain is wired into.
    pub fn ctx(&self) -> &AudioContext {
        &self.ctx
    }

    /// Master gain node.
    pub fn sink(&self) -> NodeId {
        self.sink
    }

    /// Settings used for device streams.
    pub fn stream_config(&self) -> StreamConfig {
        self.stream_config
    }

    /// Pedals in chain order.
    pub fn effects(&self) -> &[Pedal] {
        &self.effects
    }

    /// Model names in chain order.
    pub fn models(&self) -> Vec<&str> {
        self.effects.iter().map(|e| e.model()).collect()
    }

    /// Number of pedals.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Index of the pedal with `id`.
    pub fn position(&self, id: EffectId) -> Option<usize> {
        self.effects.iter().position(|e| e.id() == id)
    }

    /// Pedal with `id`.
    pub fn get(&self, id: EffectId) -> Option<&Pedal> {
        self.effects.iter().find(|e| e.id() == id)
    }

    /// Pedal with `id`, mutably. Structural changes must go through the
    /// manager.
    pub fn get_mut(&mut self, id: EffectId) -> Option<&mut Pedal> {
        self.effects.iter_mut().find(|e| e.id() == id)
    }

    fn has_terminal(&self) -> bool {
        self.effects.last().is_some_and(|e| e.is_terminal())
    }

    /// Insert `effect` and rebuild.
    ///
    /// With `post` the effect is appended; otherwise it goes immediately
    /// before the current last element. A non-terminal effect never lands
    /// after the cabinet. A terminal effect always goes last and replaces
    /// (and disposes) any previous one.
    pub fn add_effect(&mut self, effect: Pedal, post: bool) -> EffectId {
        let id = effect.id();
        let model = effect.model().to_string();
        self.disconnect_all();

        if effect.is_terminal() {
            if self.has_terminal()
                && let Some(mut previous) = self.effects.pop()
            {
                tracing::info!(
                    replaced = %previous.model(),
                    with = %model,
                    "terminal effect replaced"
                );
                previous.dispose();
            }
            self.effects.push(effect);
        } else {
            let len = self.effects.len();
            let index = if post {
                len - usize::from(self.has_terminal())
            } else {
                len.saturating_sub(1)
            };
            self.effects.insert(index, effect);
        }

        self.connect_all();
        tracing::debug!(%id, %model, post, len = self.effects.len(), "effect added");
        id
    }

    /// Take the pedal with `id` out of the chain and rebuild.
    ///
    /// The caller owns the returned pedal and normally disposes it.
    pub fn remove_effect(&mut self, id: EffectId) -> Option<Pedal> {
        let index = self.position(id)?;
        self.disconnect_all();
        let removed = self.effects.remove(index);
        self.connect_all();
        tracing::debug!(%id, model = %removed.model(), "effect removed");
        Some(removed)
    }

    /// Move the pedal at `from` to `to` and rebuild.
    ///
    /// Out-of-range indices, and moves that would displace the cabinet from
    /// last place, are rejected.
    pub fn move_effect(&mut self, from: usize, to: usize) -> bool {
        let len = self.effects.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }
        if self.has_terminal() && (from == len - 1 || to == len - 1) {
            tracing::warn!(from, to, "move would displace the terminal effect");
            return false;
        }

        self.disconnect_all();
        let effect = self.effects.remove(from);
        self.effects.insert(to, effect);
        self.connect_all();
        tracing::debug!(from, to, "effect moved");
        true
    }

    /// Flip bypass on the pedal with `id`; returns whether it is now engaged.
    ///
    /// Bypass is internal to the effect, so the chain is not rebuilt.
    pub fn toggle_effect(&mut self, id: EffectId) -> Option<bool> {
        let effect = self.get_mut(id)?;
        effect.toggle_bypass();
        Some(effect.is_active())
    }

    /// Wire source, pedals and sink end to end.
    pub fn connect_all(&self) {
        let source = self.ctx.line_in();
        match (self.effects.first(), self.effects.last()) {
            (Some(first), Some(last)) => {
                self.ctx.connect(source, first.input());
                for pair in self.effects.windows(2) {
                    pair[0].connect_to(&pair[1]);
                }
                last.connect(self.sink);
            }
            _ => self.ctx.connect(source, self.sink),
        }
        tracing::debug!(len = self.effects.len(), "chain connected");
    }

    /// Remove the source edge and every pedal's outgoing edges.
    pub fn disconnect_all(&self) {
        self.ctx.disconnect(self.ctx.line_in());
        for effect in &self.effects {
            effect.disconnect();
        }
    }

    /// Master level, clamped to `[0, 1]` and ramped.
    pub fn set_master(&mut self, master: f32) {
        self.master = clamp(master, 0.0, 1.0);
        self.ctx.ramp_param(self.sink, ParamKind::Gain, self.master);
    }

    /// Current master level.
    pub fn master(&self) -> f32 {
        self.master
    }

    /// Capture the chain as a preset named `id`.
    ///
    /// Pedals keep list order; the cabinet carries the master level.
    pub fn take_snapshot(&self, id: impl Into<String>) -> Preset {
        let mut preset = Preset::new(id);
        for effect in &self.effects {
            let snapshot = effect.take_snapshot();
            if effect.is_terminal() {
                preset.cabinet = Some(snapshot);
            } else {
                preset.pedals.push(snapshot);
            }
        }
        preset.set_master(self.master);
        preset
    }

    /// Replace the chain with `preset`.
    ///
    /// Every effect is built before anything is touched, so a failure leaves
    /// the current chain in place.
    pub fn load_preset(&mut self, preset: &Preset, registry: &EffectRegistry) -> Result<()> {
        validate_preset(preset, registry)?;

        let mut built: Vec<Pedal> = Vec::with_capacity(preset.len());
        let cabinet = preset.cabinet.as_ref().map(|cab| {
            let mut cab = cab.clone();
            cab.params.remove(MASTER_PARAM);
            cab
        });
        for snapshot in preset.pedals.iter().chain(cabinet.as_ref()) {
            match self.build(snapshot, registry) {
                Some(pedal) => built.push(pedal),
                None => {
                    for mut pedal in built {
                        pedal.dispose();
                    }
                    return Err(RigError::UnknownEffect(snapshot.model.clone()));
                }
            }
        }

        self.disconnect_all();
        let previous = std::mem::replace(&mut self.effects, built);
        for mut effect in previous {
            effect.dispose();
        }
        self.connect_all();

        if let Some(master) = preset.master() {
            self.set_master(master);
        }
        tracing::info!(id = %preset.id, len = self.effects.len(), "preset applied");
        Ok(())
    }

    fn build(&self, snapshot: &EffectSnapshot, registry: &EffectRegistry) -> Option<Pedal> {
        registry.from_snapshot(snapshot, &self.ctx)
    }

    /// Dispose every pedal, leaving line-in wired to the sink.
    pub fn clear(&mut self) {
        self.disconnect_all();
        for mut effect in self.effects.drain(..) {
            effect.dispose();
        }
        self.connect_all();
    }

    /// Ask for an input stream on `device` (`None` for the default).
    ///
    /// No-op when that device is already open or another open is in flight.
    /// The outcome is picked up by [`poll_input`](Self::poll_input).
    pub fn request_input(&mut self, backend: Arc<dyn DeviceBackend>, device: Option<&str>) -> bool {
        if let Some(active) = &self.input
            && active.device.as_deref() == device
        {
            tracing::debug!(device = ?device, "input already open");
            return false;
        }
        let requested = self.acquirer.request(
            backend,
            device.map(str::to_string),
            self.stream_config,
            self.line_in_tx.clone(),
        );
        if requested {
            tracing::info!(device = ?device, "input requested");
        }
        requested
    }

    /// Install a finished input open, if any. Returns whether a new stream
    /// went live.
    pub fn poll_input(&mut self) -> bool {
        match self.acquirer.poll() {
            Some(opened) => self.install_input(opened),
            None => false,
        }
    }

    /// Like [`poll_input`](Self::poll_input), blocking up to `timeout`.
    pub fn wait_input(&mut self, timeout: Duration) -> bool {
        match self.acquirer.wait(timeout) {
            Some(opened) => self.install_input(opened),
            None => false,
        }
    }

    fn install_input(&mut self, opened: InputOpened) -> bool {
        match opened.result {
            Ok(stream) => {
                tracing::info!(device = ?opened.device, "input stream live");
                self.input = Some(ActiveStream {
                    device: opened.device,
                    _stream: stream,
                    enabled: None,
                });
                true
            }
            Err(err) => {
                tracing::warn!(device = ?opened.device, error = %err, "input unavailable");
                false
            }
        }
    }

    /// Move playback to `device` (`None` for the default).
    ///
    /// The chain is disconnected around the swap so neither stream renders
    /// it half-built, and the previous output writes silence while the new
    /// one opens so only one stream renders the graph and drains line-in.
    /// On failure the previous output resumes.
    pub fn switch_output(&mut self, backend: &dyn DeviceBackend, device: Option<&str>) -> Result<()> {
        self.disconnect_all();
        let previous = self.output.as_ref().and_then(|s| s.enabled.clone());
        if let Some(enabled) = &previous {
            enabled.store(false, Ordering::Release);
        }
        let feed = RenderFeed::new(self.ctx.clone(), self.line_in_rx.clone());
        let enabled = feed.enabled();
        let outcome = match backend.open_output(device, &self.stream_config, feed.into_callback()) {
            Ok(stream) => {
                self.output = Some(ActiveStream {
                    device: device.map(str::to_string),
                    _stream: stream,
                    enabled: Some(enabled),
                });
                tracing::info!(device = ?device, backend = backend.name(), "output switched");
                Ok(())
            }
            Err(err) => {
                if let Some(enabled) = &previous {
                    enabled.store(true, Ordering::Release);
                }
                tracing::warn!(device = ?device, error = %err, "output unavailable");
                Err(err.into())
            }
        };
        self.connect_all();
        outcome
    }

    /// Whether an input stream is live.
    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Whether an output stream is live.
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Label the live input was opened with; `None` also for the default.
    pub fn input_device(&self) -> Option<&str> {
        self.input.as_ref().and_then(|s| s.device.as_deref())
    }

    /// Label the live output was opened with; `None` also for the default.
    pub fn output_device(&self) -> Option<&str> {
        self.output.as_ref().and_then(|s| s.device.as_deref())
    }

    /// Stop both device streams. The chain stays wired.
    pub fn close_streams(&mut self) {
        self.output = None;
        self.input = None;
    }
}

impl Drop for ChainManager {
    fn drop(&mut self) {
        self.close_streams();
        for effect in &mut self.effects {
            effect.dispose();
        }
    }
}

impl std::fmt::Debug for ChainManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainManager")
            .field("effects", &self.models())
            .field("master", &self.master)
            .field("input", &self.input.as_ref().map(|s| &s.device))
            .field("output", &self.output.as_ref().map(|s| &s.device))
            .finish_non_exhaustive()
    }
}
