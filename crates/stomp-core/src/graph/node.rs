//! Node identities and per-node render state.

use super::RENDER_QUANTUM;
use super::convolver::PartitionedConvolver;
use crate::biquad::{self, Biquad, BiquadKind};
use crate::delay::InterpolatedDelay;
use crate::envelope::EnvelopeFollower;
use crate::math::{db_to_linear, linear_to_db};
use crate::one_pole::{IirCoefficients, IirFilter};
use crate::oscillator::{Oscillator, Waveform};
use crate::param::AudioParam;
use libm::floorf;

/// Identifier of a node in an [`AudioContext`](super::AudioContext).
///
/// Ids are assigned sequentially and never reused, so a stale id can only
/// ever refer to a released node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// External input fed by `render`.
    LineIn,
    /// Final output read by `render`.
    Destination,
    /// Multiply by a gain param.
    Gain,
    /// Second-order filter section.
    Biquad,
    /// Arbitrary-order IIR filter.
    Iir,
    /// Curve lookup distortion.
    WaveShaper,
    /// Delay line.
    Delay,
    /// Impulse-response convolution.
    Convolver,
    /// Signal source.
    Oscillator,
    /// Dynamics compressor.
    Compressor,
    /// Pass-through tap exposing recent samples.
    Analyser,
}

/// An automatable parameter on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Linear gain of a Gain node.
    Gain,
    /// Frequency of a Biquad or Oscillator node, in Hz.
    Frequency,
    /// Q of a Biquad node.
    Q,
    /// Gain of a peaking Biquad, in dB.
    BiquadGain,
    /// Delay time, in seconds.
    DelayTime,
    /// Compressor threshold, in dB.
    Threshold,
    /// Compressor knee width, in dB.
    Knee,
    /// Compressor ratio.
    Ratio,
    /// Compressor attack, in seconds.
    Attack,
    /// Compressor release, in seconds.
    Release,
}

/// Per-sample modulation inputs of one node for the current quantum.
#[derive(Debug, Default)]
pub(crate) struct ModBus {
    slots: Vec<(ParamKind, Vec<f32>)>,
    used: usize,
}

impl ModBus {
    pub fn clear(&mut self) {
        self.used = 0;
    }

    pub fn accumulate(&mut self, kind: ParamKind, source: &[f32]) {
        if let Some((_, buf)) = self.slots[..self.used].iter_mut().find(|(k, _)| *k == kind) {
            for (b, s) in buf.iter_mut().zip(source) {
                *b += s;
            }
            return;
        }
        if self.used == self.slots.len() {
            self.slots.push((kind, vec![0.0; RENDER_QUANTUM]));
        }
        let slot = &mut self.slots[self.used];
        slot.0 = kind;
        slot.1.copy_from_slice(&source[..RENDER_QUANTUM]);
        self.used += 1;
    }

    pub fn get(&self, kind: ParamKind) -> Option<&[f32]> {
        self.slots[..self.used]
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, buf)| buf.as_slice())
    }
}

/// Render state of one node.
#[derive(Debug)]
pub(crate) enum Processor {
    LineIn,
    Destination,
    Gain {
        gain: AudioParam,
    },
    Biquad {
        kind: BiquadKind,
        frequency: AudioParam,
        q: AudioParam,
        gain: AudioParam,
        filter: Biquad,
        applied: Option<(f32, f32, f32)>,
    },
    Iir {
        filter: IirFilter,
    },
    WaveShaper {
        curve: Option<Vec<f32>>,
    },
    Delay {
        delay_time: AudioParam,
        line: InterpolatedDelay,
        in_cycle: bool,
    },
    Convolver {
        engine: Option<Box<PartitionedConvolver>>,
    },
    Oscillator {
        frequency: AudioParam,
        osc: Oscillator,
    },
    Compressor {
        threshold: AudioParam,
        knee: AudioParam,
        ratio: AudioParam,
        attack: AudioParam,
        release: AudioParam,
        envelope: EnvelopeFollower,
        reduction_db: f32,
    },
    Analyser {
        ring: Vec<f32>,
        pos: usize,
    },
}

impl Processor {
    pub fn gain(initial: f32, sr: f32) -> Self {
        Processor::Gain {
            gain: AudioParam::new(initial, f32::MIN, f32::MAX, sr),
        }
    }

    pub fn biquad(kind: BiquadKind, frequency: f32, q: f32, sr: f32) -> Self {
        Processor::Biquad {
            kind,
            frequency: AudioParam::new(frequency, 0.0, sr / 2.0, sr),
            q: AudioParam::new(q, 1e-4, 1000.0, sr),
            gain: AudioParam::new(0.0, -40.0, 40.0, sr),
            filter: Biquad::new(),
            applied: None,
        }
    }

    pub fn iir(coefficients: &IirCoefficients) -> Self {
        Processor::Iir {
            filter: IirFilter::new(coefficients),
        }
    }

    pub fn delay(max_seconds: f32, sr: f32) -> Self {
        let max_seconds = max_seconds.max(0.0);
        Processor::Delay {
            delay_time: AudioParam::new(0.0, 0.0, max_seconds, sr),
            // one extra quantum so cycle delays can clamp up to it
            line: InterpolatedDelay::new((max_seconds * sr) as usize + RENDER_QUANTUM + 2),
            in_cycle: false,
        }
    }

    pub fn oscillator(waveform: Waveform, frequency: f32, sr: f32) -> Self {
        Processor::Oscillator {
            frequency: AudioParam::new(frequency, -sr / 2.0, sr / 2.0, sr),
            osc: Oscillator::new(sr, waveform),
        }
    }

    pub fn compressor(sr: f32) -> Self {
        let mut envelope = EnvelopeFollower::new(sr);
        envelope.set_attack_ms(3.0);
        envelope.set_release_ms(250.0);
        Processor::Compressor {
            threshold: AudioParam::new(-24.0, -100.0, 0.0, sr),
            knee: AudioParam::new(30.0, 0.0, 40.0, sr),
            ratio: AudioParam::new(12.0, 1.0, 20.0, sr),
            attack: AudioParam::new(0.003, 0.0, 1.0, sr),
            release: AudioParam::new(0.25, 0.0, 1.0, sr),
            envelope,
            reduction_db: 0.0,
        }
    }

    pub fn analyser(fft_size: usize) -> Self {
        Processor::Analyser {
            ring: vec![0.0; fft_size.max(32)],
            pos: 0,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Processor::LineIn => NodeKind::LineIn,
            Processor::Destination => NodeKind::Destination,
            Processor::Gain { .. } => NodeKind::Gain,
            Processor::Biquad { .. } => NodeKind::Biquad,
            Processor::Iir { .. } => NodeKind::Iir,
            Processor::WaveShaper { .. } => NodeKind::WaveShaper,
            Processor::Delay { .. } => NodeKind::Delay,
            Processor::Convolver { .. } => NodeKind::Convolver,
            Processor::Oscillator { .. } => NodeKind::Oscillator,
            Processor::Compressor { .. } => NodeKind::Compressor,
            Processor::Analyser { .. } => NodeKind::Analyser,
        }
    }

    pub fn param_mut(&mut self, kind: ParamKind) -> Option<&mut AudioParam> {
        match (self, kind) {
            (Processor::Gain { gain }, ParamKind::Gain) => Some(gain),
            (Processor::Biquad { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (Processor::Biquad { q, .. }, ParamKind::Q) => Some(q),
            (Processor::Biquad { gain, .. }, ParamKind::BiquadGain) => Some(gain),
            (Processor::Delay { delay_time, .. }, ParamKind::DelayTime) => Some(delay_time),
            (Processor::Oscillator { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (Processor::Compressor { threshold, .. }, ParamKind::Threshold) => Some(threshold),
            (Processor::Compressor { knee, .. }, ParamKind::Knee) => Some(knee),
            (Processor::Compressor { ratio, .. }, ParamKind::Ratio) => Some(ratio),
            (Processor::Compressor { attack, .. }, ParamKind::Attack) => Some(attack),
            (Processor::Compressor { release, .. }, ParamKind::Release) => Some(release),
            _ => None,
        }
    }

    /// Render one quantum of `input` into `output`.
    ///
    /// `scratch` holds at least four quantum-sized buffers for param values.
    /// Cycle-split delays are handled by [`read_cycle`](Self::read_cycle) and
    /// [`write_cycle`](Self::write_cycle) instead.
    pub fn process(
        &mut self,
        input: &[f32],
        mods: &ModBus,
        scratch: &mut [Vec<f32>],
        output: &mut [f32],
        sample_rate: f32,
    ) {
        let n = output.len();
        match self {
            Processor::LineIn => {}
            Processor::Destination | Processor::WaveShaper { curve: None } => {
                output.copy_from_slice(input);
            }
            Processor::Gain { gain } => {
                let g = &mut scratch[0][..n];
                gain.fill(mods.get(ParamKind::Gain), g);
                for ((o, x), g) in output.iter_mut().zip(input).zip(g.iter()) {
                    *o = x * g;
                }
            }
            Processor::Biquad {
                kind,
                frequency,
                q,
                gain,
                filter,
                applied,
            } => {
                let (head, tail) = scratch.split_at_mut(1);
                let (mid, rest) = tail.split_at_mut(1);
                let f = &mut head[0][..n];
                let qs = &mut mid[0][..n];
                let gs = &mut rest[0][..n];
                frequency.fill(mods.get(ParamKind::Frequency), f);
                q.fill(mods.get(ParamKind::Q), qs);
                gain.fill(mods.get(ParamKind::BiquadGain), gs);
                for i in 0..n {
                    let key = (f[i], qs[i], gs[i]);
                    if *applied != Some(key) {
                        filter.set_coefficients(biquad::coefficients(
                            *kind,
                            key.0,
                            key.1,
                            key.2,
                            sample_rate,
                        ));
                        *applied = Some(key);
                    }
                    output[i] = filter.process(input[i]);
                }
            }
            Processor::Iir { filter } => {
                for (o, x) in output.iter_mut().zip(input) {
                    *o = filter.process(*x);
                }
            }
            Processor::WaveShaper { curve: Some(curve) } => {
                for (o, x) in output.iter_mut().zip(input) {
                    *o = shape(curve, *x);
                }
            }
            Processor::Delay {
                delay_time, line, ..
            } => {
                let d = &mut scratch[0][..n];
                delay_time.fill(mods.get(ParamKind::DelayTime), d);
                for i in 0..n {
                    line.write(input[i]);
                    output[i] = line.read(d[i] * sample_rate);
                }
            }
            Processor::Convolver { engine } => match engine {
                Some(engine) => engine.process(input, output),
                None => output.fill(0.0),
            },
            Processor::Oscillator { frequency, osc } => {
                let f = &mut scratch[0][..n];
                frequency.fill(mods.get(ParamKind::Frequency), f);
                for (o, f) in output.iter_mut().zip(f.iter()) {
                    *o = osc.next(*f);
                }
            }
            Processor::Compressor {
                threshold,
                knee,
                ratio,
                attack,
                release,
                envelope,
                reduction_db,
            } => {
                // k-rate: sampled once per quantum
                let threshold_db = threshold.next();
                let knee_db = knee.next();
                let ratio_value = ratio.next();
                envelope.set_attack_ms(attack.next() * 1000.0);
                envelope.set_release_ms(release.next() * 1000.0);
                for _ in 1..n {
                    threshold.next();
                    knee.next();
                    ratio.next();
                    attack.next();
                    release.next();
                }
                let half_knee = knee_db / 2.0;
                let slope = 1.0 - 1.0 / ratio_value;
                for (o, x) in output.iter_mut().zip(input) {
                    let level_db = linear_to_db(envelope.process(*x));
                    let overshoot = level_db - threshold_db;
                    let gr_db = if overshoot <= -half_knee {
                        0.0
                    } else if overshoot > half_knee {
                        -(overshoot * slope)
                    } else {
                        let knee_factor = (overshoot + half_knee) / knee_db;
                        -(knee_factor * knee_factor * overshoot * slope)
                    };
                    *reduction_db = gr_db;
                    *o = x * db_to_linear(gr_db);
                }
            }
            Processor::Analyser { ring, pos } => {
                output.copy_from_slice(input);
                let len = ring.len();
                for x in input {
                    ring[*pos] = *x;
                    *pos = (*pos + 1) % len;
                }
            }
        }
    }

    /// First half of a cycle-split delay: emit the quantum from history.
    ///
    /// The delay is clamped to at least one quantum so every sample read was
    /// written in an earlier quantum.
    pub fn read_cycle(
        &mut self,
        mods: &ModBus,
        scratch: &mut [Vec<f32>],
        output: &mut [f32],
        sample_rate: f32,
    ) {
        if let Processor::Delay {
            delay_time, line, ..
        } = self
        {
            let n = output.len();
            let d = &mut scratch[0][..n];
            delay_time.fill(mods.get(ParamKind::DelayTime), d);
            let floor = RENDER_QUANTUM as f32;
            for (i, o) in output.iter_mut().enumerate() {
                let samples = (d[i] * sample_rate).max(floor);
                *o = line.read(samples - i as f32 - 1.0);
            }
        }
    }

    /// Second half of a cycle-split delay: store the quantum's input.
    pub fn write_cycle(&mut self, input: &[f32]) {
        if let Processor::Delay { line, .. } = self {
            for x in input {
                line.write(*x);
            }
        }
    }

    pub fn set_in_cycle(&mut self, value: bool) {
        if let Processor::Delay { in_cycle, .. } = self {
            *in_cycle = value;
        }
    }

    pub fn is_cycle_delay(&self) -> bool {
        matches!(self, Processor::Delay { in_cycle: true, .. })
    }
}

/// Web Audio style curve lookup with linear interpolation.
pub(crate) fn shape(curve: &[f32], x: f32) -> f32 {
    let len = curve.len();
    if len == 0 {
        return x;
    }
    if len == 1 {
        return curve[0];
    }
    let last = (len - 1) as f32;
    let v = last * (x + 1.0) / 2.0;
    if v <= 0.0 {
        curve[0]
    } else if v >= last {
        curve[len - 1]
    } else {
        let k = floorf(v);
        let frac = v - k;
        let k = k as usize;
        curve[k] + (curve[k + 1] - curve[k]) * frac
    }
}
