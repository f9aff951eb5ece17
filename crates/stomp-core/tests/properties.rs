//! Property-based tests for stomp-core mapping, curves and filters.

use proptest::prelude::*;
use stomp_core::{
    Biquad, BiquadKind, CurveFamily, IirFilter, ParamSpec, biquad, clamp, equal_cross_fade,
    linear_cross_fade, map_to_min_max, one_pole_highpass, one_pole_lowpass, synthesize,
};

fn family(index: usize) -> CurveFamily {
    CurveFamily::ALL[index % CurveFamily::ALL.len()]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Clamping is idempotent and lands inside the range.
    #[test]
    fn clamp_is_idempotent(v in -1e6f32..1e6, min in -100.0f32..0.0, span in 0.0f32..100.0) {
        let max = min + span;
        let once = clamp(v, min, max);
        prop_assert!(once >= min && once <= max);
        prop_assert_eq!(clamp(once, min, max), once);
    }

    /// A setter's clamp followed by a read returns the clamped value.
    #[test]
    fn param_spec_round_trip(v in -10.0f32..10.0) {
        let spec = ParamSpec::ranged("feedback", 0.0, 0.95, 0.5);
        let applied = spec.clamp(v);
        prop_assert_eq!(applied, v.clamp(0.0, 0.95));
    }

    /// The linear map hits its endpoints and stays monotone.
    #[test]
    fn map_is_monotone(a in 0.0f32..=1.0, b in 0.0f32..=1.0, min in -50.0f32..0.0, max in 0.0f32..50.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(map_to_min_max(lo, min, max) <= map_to_min_max(hi, min, max) + 1e-4);
    }

    /// Linear fades sum to one; equal-power fades keep unit power.
    #[test]
    fn cross_fade_laws(x in 0.0f32..=1.0) {
        let (dry, wet) = linear_cross_fade(x);
        prop_assert!((dry + wet - 1.0).abs() < 1e-6);
        let (dry, wet) = equal_cross_fade(x);
        prop_assert!((dry * dry + wet * wet - 1.0).abs() < 1e-4);
    }

    /// Every family yields `n + 1` finite points for any amount.
    #[test]
    fn curve_length_and_finiteness(index in 0usize..9, amount in -1.0f32..2.0, n in 0usize..2048) {
        let curve = synthesize(family(index), amount, n);
        prop_assert_eq!(curve.len(), n + 1);
        prop_assert!(curve.iter().all(|v| v.is_finite()));
    }

    /// Chebyshev curves pass through the origin at every degree.
    #[test]
    fn chebyshev_origin(amount in 0.0f32..=1.0, half in 1usize..512) {
        let curve = synthesize(CurveFamily::Chebyshev, amount, half * 2);
        prop_assert_eq!(curve[half], 0.0);
    }

    /// One-pole filters stay finite for any audible cutoff.
    #[test]
    fn one_pole_stability(cutoff in 20.0f32..20000.0, input in prop::array::uniform32(-1.0f32..=1.0)) {
        let mut lp = IirFilter::new(&one_pole_lowpass(cutoff, 48000.0));
        let mut hp = IirFilter::new(&one_pole_highpass(cutoff, 48000.0));
        for &x in &input {
            prop_assert!(lp.process(x).is_finite());
            prop_assert!(hp.process(x).is_finite());
        }
    }

    /// Allpass and peaking sections (used by the phaser and tone stacks) stay finite.
    #[test]
    fn biquad_stability(freq in 0.0f32..30000.0, q in 0.0f32..20.0, gain in -24.0f32..24.0,
                        input in prop::array::uniform32(-1.0f32..=1.0)) {
        for kind in [BiquadKind::Allpass, BiquadKind::Peaking, BiquadKind::Lowpass] {
            let mut filter = Biquad::new();
            filter.set_coefficients(biquad::coefficients(kind, freq, q, gain, 48000.0));
            for &x in &input {
                prop_assert!(filter.process(x).is_finite());
            }
        }
    }
}
