//! Chain orchestration and live routing for the stomp guitar rig.
//!
//! [`ChainManager`] owns the ordered pedal list between the line-in source
//! and the master sink and rebuilds the graph on every structural change. It
//! also owns the device streams: a single-flight input open and an output
//! stream whose callback renders the graph through a [`RenderFeed`].
//!
//! # Example
//!
//! ```rust
//! use stomp_core::AudioContext;
//! use stomp_effects::{Cabinet, Chorus};
//! use stomp_rig::ChainManager;
//!
//! let ctx = AudioContext::new(48000.0);
//! let mut chain = ChainManager::new(&ctx);
//! chain.add_effect(Cabinet::new(&ctx).into(), true);
//! chain.add_effect(Chorus::new(&ctx).into(), false);
//! assert_eq!(chain.models(), ["chorus", "cabinet"]);
//! ```

pub mod chain;
pub mod error;
pub mod feed;

pub use chain::ChainManager;
pub use error::{Result, RigError};
pub use feed::{LINE_IN_BLOCKS, MAX_PENDING, RenderFeed, line_in_channel};
