//! Envelope follower for the dynamics compressor node.

use libm::expf;

/// Peak envelope follower with separate attack and release.
///
/// ```rust
/// use stomp_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::new(48000.0);
/// env.set_attack_ms(3.0);
/// env.set_release_ms(250.0);
/// let level = env.process(0.5);
/// assert!(level > 0.0 && level < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    attack_ms: f32,
    release_ms: f32,
}

impl EnvelopeFollower {
    /// New follower with 10 ms attack and 100 ms release.
    pub fn new(sample_rate: f32) -> Self {
        let mut follower = Self {
            envelope: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            attack_ms: 10.0,
            release_ms: 100.0,
        };
        follower.recalculate_coefficients();
        follower
    }

    /// Set attack time in milliseconds. No-op when unchanged.
    pub fn set_attack_ms(&mut self, attack_ms: f32) {
        let attack_ms = attack_ms.max(0.01);
        if attack_ms != self.attack_ms {
            self.attack_ms = attack_ms;
            self.recalculate_coefficients();
        }
    }

    /// Set release time in milliseconds. No-op when unchanged.
    pub fn set_release_ms(&mut self, release_ms: f32) {
        let release_ms = release_ms.max(0.01);
        if release_ms != self.release_ms {
            self.release_ms = release_ms;
            self.recalculate_coefficients();
        }
    }

    /// Track one sample and return the envelope level.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let input_abs = input.abs();
        let coeff = if input_abs > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * input_abs;
        self.envelope
    }

    /// Current level.
    pub fn level(&self) -> f32 {
        self.envelope
    }

    /// Reset to silence.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = expf(-1.0 / (self.attack_ms * self.sample_rate / 1000.0));
        self.release_coeff = expf(-1.0 / (self.release_ms * self.sample_rate / 1000.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rises_and_falls() {
        let mut env = EnvelopeFollower::new(48000.0);
        for _ in 0..48000 {
            env.process(1.0);
        }
        assert!(env.level() > 0.99);
        for _ in 0..48000 {
            env.process(0.0);
        }
        assert!(env.level() < 0.01);
        env.reset();
        assert_eq!(env.level(), 0.0);
    }
}
