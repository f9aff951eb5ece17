//! Host audio graph.
//!
//! Effects and the chain manager never process samples themselves; they build
//! and rewire a graph of small processing nodes (gains, filters, delays,
//! waveshapers, convolvers, oscillators) and schedule parameter changes on
//! them. This module is that graph.
//!
//! # Architecture
//!
//! - [`AudioContext`] is a clonable handle to one graph behind a
//!   `parking_lot::Mutex`. Structural calls (`create_*`, `connect`,
//!   `disconnect`, `release`) and parameter calls lock it briefly from the
//!   control thread; the audio callback locks it once per `render` call.
//! - Topology changes only mark the graph dirty. Before the next render
//!   quantum it recompiles into a flat schedule (see `compile`).
//! - Audio is rendered in quanta of [`RENDER_QUANTUM`] frames. `render`
//!   buffers through FIFOs so callers may use any block length.
//!
//! # Cycles
//!
//! A cycle must contain a delay node. Such a delay is split: its output for a
//! quantum is read from history at the start, its input is written at the
//! end, and its delay time is clamped to at least one quantum. Nodes on a
//! delay-free cycle render silence.
//!
//! # Example
//!
//! ```rust
//! use stomp_core::graph::{AudioContext, ParamKind};
//!
//! let ctx = AudioContext::new(48000.0);
//! let gain = ctx.create_gain(0.5);
//! ctx.connect(ctx.line_in(), gain);
//! ctx.connect(gain, ctx.destination());
//!
//! let input = vec![1.0; 256];
//! let mut output = vec![0.0; 256];
//! ctx.render(&input, &mut output);
//! assert!(output.iter().all(|s| (*s - 0.5).abs() < 1e-6));
//!
//! ctx.ramp_param(gain, ParamKind::Gain, 1.0);
//! assert_eq!(ctx.param_target(gain, ParamKind::Gain), Some(1.0));
//! ```

mod compile;
mod context;
pub(crate) mod convolver;
mod node;

pub use context::AudioContext;
pub use node::{NodeId, NodeKind, ParamKind};

/// Frames per render quantum.
pub const RENDER_QUANTUM: usize = 128;

/// Where an edge ends: a node's audio input or one of its params.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Node(NodeId),
    Param(NodeId, ParamKind),
}

impl Target {
    pub fn node(self) -> NodeId {
        match self {
            Target::Node(id) | Target::Param(id, _) => id,
        }
    }
}

/// A directed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Edge {
    pub from: NodeId,
    pub to: Target,
}
