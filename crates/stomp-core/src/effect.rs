//! The effect capability interface and its bypass-safe core.
//!
//! Every effect owns a unity-gain `input` and `output` node plus an ordered
//! list of internal [`Stage`]s. While engaged the audio path is
//!
//! ```text
//! input → stage0 → stage1 → … → stageN → output
//! ```
//!
//! and while bypassed it is simply `input → output`. Toggling only rewires
//! edges; parameter values are never touched. The input node is always
//! disconnected before it is reconnected, so it never feeds both paths at
//! once.
//!
//! Concrete effects embed an [`EffectCore`] and implement the three required
//! methods of [`Effect`]; everything else is provided.
//!
//! ## Setter convention
//!
//! Each control is described by a [`ParamSpec`]. A setter calls
//! [`EffectCore::set`], which clamps the value, publishes it to the effect's
//! [`ParamState`] and hands it back; the setter then maps it to node units
//! and applies it with [`EffectCore::ramp`]. On a disposed effect `set`
//! returns `None` and nothing happens.

use crate::graph::{AudioContext, NodeId, ParamKind};
use crate::observable::ParamState;
use crate::param::ParamSpec;
use crate::snapshot::{EffectSnapshot, ParamMap, ParamValue};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of one effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

static NEXT_EFFECT: AtomicU64 = AtomicU64::new(1);

impl EffectId {
    /// A fresh, process-wide unique id.
    pub fn next() -> Self {
        Self(NEXT_EFFECT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fx{}", self.0)
    }
}

/// One step of an effect's internal chain.
///
/// Audio enters at `entry` and leaves at `exit`. `nodes` lists every node the
/// stage owns, including side nodes such as LFOs or feedback gains, so they
/// can be released on dispose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Node receiving the previous stage's output.
    pub entry: NodeId,
    /// Node feeding the next stage.
    pub exit: NodeId,
    /// All nodes owned by the stage.
    pub nodes: Vec<NodeId>,
}

impl Stage {
    /// A stage made of a single node.
    pub fn node(id: NodeId) -> Self {
        Self {
            entry: id,
            exit: id,
            nodes: vec![id],
        }
    }

    /// A stage with distinct entry and exit nodes.
    ///
    /// `entry` and `exit` are added to `nodes` if missing.
    pub fn composite(entry: NodeId, exit: NodeId, mut nodes: Vec<NodeId>) -> Self {
        for id in [entry, exit] {
            if !nodes.contains(&id) {
                nodes.push(id);
            }
        }
        Self { entry, exit, nodes }
    }
}

/// State shared by every effect: identity, ports, stages, bypass and params.
pub struct EffectCore {
    id: EffectId,
    model: String,
    ctx: AudioContext,
    input: NodeId,
    output: NodeId,
    stages: Vec<Stage>,
    bypassed: Option<bool>,
    disposed: bool,
    state: Arc<ParamState>,
}

impl EffectCore {
    /// Create the ports and wire `stages` engaged.
    pub fn new(ctx: &AudioContext, model: impl Into<String>, stages: Vec<Stage>) -> Self {
        let core = Self {
            id: EffectId::next(),
            model: model.into(),
            ctx: ctx.clone(),
            input: ctx.create_gain(1.0),
            output: ctx.create_gain(1.0),
            stages,
            bypassed: None,
            disposed: false,
            state: Arc::new(ParamState::new()),
        };
        core.wire_engaged();
        tracing::debug!(id = %core.id, model = %core.model, stages = core.stages.len(), "effect created");
        core
    }

    /// Instance id.
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Graph the effect lives in.
    pub fn ctx(&self) -> &AudioContext {
        &self.ctx
    }

    /// Input port.
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// Output port.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Internal stages in processing order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// `None` until the first toggle, then whether the effect is bypassed.
    pub fn bypassed(&self) -> Option<bool> {
        self.bypassed
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Observable applied values.
    pub fn state(&self) -> &Arc<ParamState> {
        &self.state
    }

    /// Clamp `value` into `spec`, publish it and return it.
    ///
    /// Returns `None` on a disposed effect.
    pub fn set(&self, spec: &ParamSpec, value: f32) -> Option<f32> {
        if self.disposed {
            return None;
        }
        let value = spec.clamp(value);
        self.state.publish(spec.name, ParamValue::Number(value));
        Some(value)
    }

    /// Publish a non-numeric control value.
    pub fn publish(&self, name: &str, value: ParamValue) {
        if !self.disposed {
            self.state.publish(name, value);
        }
    }

    /// Last applied numeric value of `name`.
    pub fn number(&self, name: &str) -> Option<f32> {
        self.state.get_number(name)
    }

    /// Ramp `kind` on `node` toward `value`. No-op once disposed.
    pub fn ramp(&self, node: NodeId, kind: ParamKind, value: f32) {
        if !self.disposed {
            self.ctx.ramp_param(node, kind, value);
        }
    }

    /// Flip between engaged and bypassed routing.
    ///
    /// A never-toggled effect counts as engaged.
    pub fn toggle(&mut self) {
        if self.disposed {
            return;
        }
        let engaged = self.bypassed != Some(true);
        self.ctx.disconnect(self.input);
        if engaged {
            if let Some(last) = self.stages.last() {
                self.ctx.disconnect_from(last.exit, self.output);
            }
            self.ctx.connect(self.input, self.output);
            self.bypassed = Some(true);
        } else {
            self.wire_engaged();
            self.bypassed = Some(false);
        }
        tracing::debug!(id = %self.id, bypassed = engaged, "bypass toggled");
    }

    fn wire_engaged(&self) {
        let Some(first) = self.stages.first() else {
            self.ctx.connect(self.input, self.output);
            return;
        };
        self.ctx.connect(self.input, first.entry);
        for pair in self.stages.windows(2) {
            self.ctx.connect(pair[0].exit, pair[1].entry);
        }
        if let Some(last) = self.stages.last() {
            self.ctx.connect(last.exit, self.output);
        }
    }

    /// Disconnect and release every owned node, then complete the state.
    ///
    /// Nodes a sub-component already released are skipped. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let owned = self
            .stages
            .iter()
            .flat_map(|stage| stage.nodes.iter().copied())
            .chain([self.input, self.output]);
        for node in owned {
            if self.ctx.contains(node) {
                self.ctx.disconnect(node);
                self.ctx.release(node);
            }
        }
        self.state.complete();
        self.disposed = true;
        tracing::debug!(id = %self.id, model = %self.model, "effect disposed");
    }
}

impl std::fmt::Debug for EffectCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectCore")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("stages", &self.stages.len())
            .field("bypassed", &self.bypassed)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

/// Capability interface shared by all effects.
///
/// # Example
///
/// ```rust
/// use stomp_core::{AudioContext, Effect, EffectCore, ParamSpec, ParamValue, Stage};
/// use stomp_core::graph::ParamKind;
///
/// const LEVEL: ParamSpec = ParamSpec::unit("level", 1.0);
///
/// struct Level {
///     core: EffectCore,
///     gain: stomp_core::graph::NodeId,
/// }
///
/// impl Level {
///     fn new(ctx: &AudioContext) -> Self {
///         let gain = ctx.create_gain(1.0);
///         Self { core: EffectCore::new(ctx, "level", vec![Stage::node(gain)]), gain }
///     }
///
///     fn set_level(&mut self, v: f32) {
///         if let Some(v) = self.core.set(&LEVEL, v) {
///             self.core.ramp(self.gain, ParamKind::Gain, v);
///         }
///     }
/// }
///
/// impl Effect for Level {
///     fn core(&self) -> &EffectCore { &self.core }
///     fn core_mut(&mut self) -> &mut EffectCore { &mut self.core }
///     fn param_specs(&self) -> &'static [ParamSpec] { &[LEVEL] }
///     fn apply_param(&mut self, name: &str, value: &ParamValue) -> bool {
///         match (name, value.as_number()) {
///             ("level", Some(v)) => self.set_level(v),
///             _ => return false,
///         }
///         true
///     }
/// }
///
/// let ctx = AudioContext::new(48000.0);
/// let mut level = Level::new(&ctx);
/// level.set_level(2.0);
/// assert_eq!(level.take_snapshot().number("level"), Some(1.0));
/// ```
pub trait Effect: Send {
    /// Shared core.
    fn core(&self) -> &EffectCore;

    /// Shared core, mutably.
    fn core_mut(&mut self) -> &mut EffectCore;

    /// Controls this effect accepts, with their ranges.
    fn param_specs(&self) -> &'static [ParamSpec];

    /// Apply one named control. Returns `false` for unknown names or values
    /// of the wrong type.
    fn apply_param(&mut self, name: &str, value: &ParamValue) -> bool;

    /// Whether the effect must sit at the end of a chain.
    fn is_terminal(&self) -> bool {
        false
    }

    /// Called after every bypass transition.
    fn on_bypass_change(&mut self, _engaged: bool) {}

    /// Called once, before the core releases its nodes.
    fn on_dispose(&mut self) {}

    /// Instance id.
    fn id(&self) -> EffectId {
        self.core().id()
    }

    /// Model name.
    fn model(&self) -> &str {
        self.core().model()
    }

    /// Input port.
    fn input(&self) -> NodeId {
        self.core().input()
    }

    /// Output port.
    fn output(&self) -> NodeId {
        self.core().output()
    }

    /// Whether the effect is engaged.
    fn is_active(&self) -> bool {
        self.core().bypassed() != Some(true)
    }

    /// Flip bypass and publish the new `active` value.
    fn toggle_bypass(&mut self) {
        if self.is_disposed() {
            return;
        }
        self.core_mut().toggle();
        let engaged = self.is_active();
        self.core().publish("active", ParamValue::Bool(engaged));
        self.on_bypass_change(engaged);
    }

    /// Engage or bypass.
    ///
    /// On a never-toggled effect this toggles once for `false` and twice for
    /// `true`, so the routing always goes through an explicit transition.
    fn set_active(&mut self, active: bool) {
        if self.is_disposed() {
            return;
        }
        match self.core().bypassed() {
            None => {
                self.toggle_bypass();
                if active {
                    self.toggle_bypass();
                }
            }
            Some(_) if self.is_active() != active => self.toggle_bypass(),
            Some(_) => self.core().publish("active", ParamValue::Bool(active)),
        }
    }

    /// Connect this effect's output to `target`.
    fn connect(&self, target: NodeId) {
        let core = self.core();
        core.ctx().connect(core.output(), target);
    }

    /// Connect this effect's output to another effect's input.
    fn connect_to(&self, other: &dyn Effect) {
        self.connect(other.input());
    }

    /// Remove every edge leaving this effect's output.
    fn disconnect(&self) {
        let core = self.core();
        core.ctx().disconnect(core.output());
    }

    /// Release every node and complete the state. Idempotent.
    fn dispose(&mut self) {
        if self.is_disposed() {
            return;
        }
        self.on_dispose();
        self.core_mut().dispose();
    }

    /// Whether the effect has been disposed.
    fn is_disposed(&self) -> bool {
        self.core().is_disposed()
    }

    /// Currently applied control values.
    fn params(&self) -> ParamMap {
        self.core().state().values()
    }

    /// `{model, params}` with `active` and every applied control.
    fn take_snapshot(&self) -> EffectSnapshot {
        let mut params = self.params();
        params.insert("active".to_string(), ParamValue::Bool(self.is_active()));
        EffectSnapshot {
            model: self.model().to_string(),
            params,
        }
    }

    /// Apply `active` and every known control in `params`.
    ///
    /// Unknown names are logged and skipped.
    fn restore(&mut self, params: &ParamMap) {
        for (name, value) in params {
            if name == "active" {
                match value.as_bool() {
                    Some(active) => self.set_active(active),
                    None => tracing::warn!(model = %self.model(), "non-boolean active skipped"),
                }
                continue;
            }
            if !self.apply_param(name, value) {
                tracing::warn!(model = %self.model(), param = %name, "unknown param skipped");
            }
        }
    }
}
