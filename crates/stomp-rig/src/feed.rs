//! Line-in feed and the output render callback.
//!
//! ```text
//!   input stream ──► bounded channel ──► RenderFeed ──► AudioContext::render ──► output
//! ```
//!
//! The output stream pulls: each callback drains whatever captured audio has
//! arrived, renders the graph over it and zero-fills when capture falls
//! behind. A feed whose [`enabled`](RenderFeed::enabled) flag is cleared
//! writes silence without touching the graph or the line-in channel.

use crossbeam_channel::Receiver;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use stomp_core::AudioContext;
use stomp_io::{InputSender, RenderCallback};

/// Captured blocks buffered between the input and output streams.
pub const LINE_IN_BLOCKS: usize = 32;

/// Captured samples held before the oldest are dropped.
pub const MAX_PENDING: usize = 8192;

/// Channel carrying captured mono blocks to the renderer.
pub fn line_in_channel() -> (InputSender, Receiver<Vec<f32>>) {
    crossbeam_channel::bounded(LINE_IN_BLOCKS)
}

/// Renders the graph from captured input.
pub struct RenderFeed {
    ctx: AudioContext,
    rx: Receiver<Vec<f32>>,
    pending: VecDeque<f32>,
    input: Vec<f32>,
    enabled: Arc<AtomicBool>,
}

impl RenderFeed {
    /// Feed rendering `ctx` from blocks arriving on `rx`.
    pub fn new(ctx: AudioContext, rx: Receiver<Vec<f32>>) -> Self {
        Self {
            ctx,
            rx,
            pending: VecDeque::with_capacity(MAX_PENDING),
            input: Vec::new(),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Shared flag gating this feed; starts set.
    pub fn enabled(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.enabled)
    }

    /// Captured samples not yet rendered.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Fill `out` with one rendered block.
    pub fn render(&mut self, out: &mut [f32]) {
        if !self.enabled.load(Ordering::Acquire) {
            out.fill(0.0);
            return;
        }
        while let Ok(block) = self.rx.try_recv() {
            self.pending.extend(block);
        }
        if self.pending.len() > MAX_PENDING {
            let excess = self.pending.len() - MAX_PENDING;
            self.pending.drain(..excess);
        }

        self.input.resize(out.len(), 0.0);
        for sample in &mut self.input {
            *sample = self.pending.pop_front().unwrap_or(0.0);
        }
        self.ctx.render(&self.input, out);
    }

    /// Box the feed as an output stream callback.
    pub fn into_callback(mut self) -> RenderCallback {
        Box::new(move |out: &mut [f32]| self.render(out))
    }
}

impl std::fmt::Debug for RenderFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderFeed")
            .field("pending", &self.pending.len())
            .field("enabled", &self.enabled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_audio_reaches_output() {
        let ctx = AudioContext::new(48000.0);
        ctx.connect(ctx.line_in(), ctx.destination());
        let (tx, rx) = line_in_channel();
        let mut feed = RenderFeed::new(ctx, rx);

        tx.send(vec![0.5; 256]).unwrap();
        let mut out = vec![0.0; 256];
        feed.render(&mut out);
        let mut second = vec![0.0; 256];
        feed.render(&mut second);

        assert!(out.iter().all(|&s| s == 0.5));
        assert!(second.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn underrun_renders_silence() {
        let ctx = AudioContext::new(48000.0);
        ctx.connect(ctx.line_in(), ctx.destination());
        let (_tx, rx) = line_in_channel();
        let mut feed = RenderFeed::new(ctx, rx);

        let mut out = vec![1.0; 128];
        feed.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn disabled_feed_leaves_line_in_alone() {
        let ctx = AudioContext::new(48000.0);
        ctx.connect(ctx.line_in(), ctx.destination());
        let (tx, rx) = line_in_channel();
        let mut feed = RenderFeed::new(ctx, rx);
        let enabled = feed.enabled();

        tx.send(vec![0.5; 128]).unwrap();
        enabled.store(false, Ordering::Release);
        let mut out = vec![1.0; 128];
        feed.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(feed.pending(), 0);
        assert_eq!(tx.len(), 1);

        enabled.store(true, Ordering::Release);
        feed.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn backlog_is_bounded() {
        let ctx = AudioContext::new(48000.0);
        let (tx, rx) = line_in_channel();
        let mut feed = RenderFeed::new(ctx, rx);

        for _ in 0..LINE_IN_BLOCKS {
            tx.send(vec![0.1; 1024]).unwrap();
        }
        let mut out = vec![0.0; 128];
        feed.render(&mut out);
        assert_eq!(feed.pending(), MAX_PENDING - 128);
    }
}
