//! Chromatic tuner.
//!
//! The tuner is a pass-through analyser stage. While engaged, a
//! [`TunerSampler`] thread copies the analyser window every interval and
//! hands it to a [`PitchWorker`]; finished readings land in an
//! [`Observable<TunerReading>`]. Only one request is in flight at a time and
//! responses to anything but the latest request are dropped.
//!
//! A new tuner starts bypassed, so no threads run until it is engaged.

use crossbeam_channel::{Sender, bounded};
use stomp_analysis::{PitchWorker, TunerReading, analyse};
use stomp_core::graph::NodeId;
use stomp_core::{AudioContext, Effect, EffectCore, Observable, ParamSpec, ParamValue, Stage};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Analyser window length.
pub const FFT_SIZE: usize = 2048;
/// Default sampling cadence.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Periodic analyser reader feeding a pitch worker.
pub struct TunerSampler {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TunerSampler {
    /// Start sampling `analyser` every `interval`, publishing into `reading`.
    pub fn start(
        ctx: AudioContext,
        analyser: NodeId,
        reading: Arc<Observable<TunerReading>>,
        interval: Duration,
    ) -> io::Result<Self> {
        let mut worker = PitchWorker::spawn()?;
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("tuner-sampler".into())
            .spawn(move || {
                let sample_rate = ctx.sample_rate();
                let mut pending: Option<u64> = None;
                // a message or a dropped sender both mean stop
                while stop_rx.recv_timeout(interval).is_err_and(|e| e.is_timeout()) {
                    while let Some(response) = worker.try_recv() {
                        if pending == Some(response.id) {
                            reading.set(response.reading);
                            pending = None;
                        }
                    }
                    if pending.is_some() {
                        continue;
                    }
                    let Some(window) = ctx.byte_time_domain_data(analyser) else {
                        break;
                    };
                    pending = worker.submit(window, sample_rate);
                    if pending.is_none() {
                        tracing::warn!("pitch worker gone, tuner sampling stopped");
                        break;
                    }
                }
                tracing::debug!("tuner sampler stopped");
            })?;
        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("tuner sampler panicked");
            }
        }
    }

    /// Whether the thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TunerSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TunerSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunerSampler")
            .field("running", &self.is_running())
            .finish()
    }
}

/// Tuner pedal.
pub struct Tuner {
    core: EffectCore,
    analyser: NodeId,
    interval: Duration,
    reading: Arc<Observable<TunerReading>>,
    sampler: Option<TunerSampler>,
}

impl Tuner {
    /// Model name.
    pub const MODEL: &'static str = "tuner";

    /// Create a bypassed tuner sampling every [`DEFAULT_INTERVAL`].
    pub fn new(ctx: &AudioContext) -> Self {
        Self::with_interval(ctx, DEFAULT_INTERVAL)
    }

    /// Create a bypassed tuner with a custom sampling cadence.
    pub fn with_interval(ctx: &AudioContext, interval: Duration) -> Self {
        let analyser = ctx.create_analyser(FFT_SIZE);
        let mut tuner = Self {
            core: EffectCore::new(ctx, Self::MODEL, vec![Stage::node(analyser)]),
            analyser,
            interval,
            reading: Arc::new(Observable::new(TunerReading::silent())),
            sampler: None,
        };
        tuner.set_active(false);
        tuner
    }

    /// Observable reading, `{None, None}` while bypassed or silent.
    pub fn reading(&self) -> &Arc<Observable<TunerReading>> {
        &self.reading
    }

    /// Sampling cadence.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a sampler thread is running.
    pub fn is_sampling(&self) -> bool {
        self.sampler.as_ref().is_some_and(TunerSampler::is_running)
    }

    /// Analyse the current window on the calling thread and publish it.
    pub fn read_now(&self) -> TunerReading {
        let reading = self
            .core
            .ctx()
            .byte_time_domain_data(self.analyser)
            .map_or_else(TunerReading::silent, |window| {
                analyse(&window, self.core.ctx().sample_rate())
            });
        self.reading.set(reading.clone());
        reading
    }

    fn start_sampler(&mut self) {
        if self.sampler.is_some() {
            return;
        }
        match TunerSampler::start(
            self.core.ctx().clone(),
            self.analyser,
            Arc::clone(&self.reading),
            self.interval,
        ) {
            Ok(sampler) => self.sampler = Some(sampler),
            Err(err) => tracing::warn!(id = %self.core.id(), error = %err, "tuner sampler failed to start"),
        }
    }

    fn stop_sampler(&mut self) {
        if let Some(mut sampler) = self.sampler.take() {
            sampler.stop();
        }
    }
}

impl Effect for Tuner {
    fn core(&self) -> &EffectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EffectCore {
        &mut self.core
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &[]
    }

    fn apply_param(&mut self, _name: &str, _value: &ParamValue) -> bool {
        false
    }

    fn on_bypass_change(&mut self, engaged: bool) {
        if engaged {
            self.start_sampler();
        } else {
            self.stop_sampler();
            self.reading.set(TunerReading::silent());
        }
    }

    fn on_dispose(&mut self) {
        self.stop_sampler();
        self.reading.set(TunerReading::silent());
        self.reading.complete();
    }
}

impl std::fmt::Debug for Tuner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tuner")
            .field("core", &self.core)
            .field("interval", &self.interval)
            .field("reading", &self.reading.get())
            .field("sampler", &self.sampler)
            .finish()
    }
}
