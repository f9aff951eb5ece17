//! Waveshaper transfer-curve synthesis.
//!
//! [`synthesize`] samples a nonlinear transfer function `f(amount, x)` over
//! `x ∈ [-1, 1]` into an `n + 1` point lookup table, which a WaveShaper node
//! then interpolates per sample. Each [`CurveFamily`] is a pure function of
//! `(amount, x)`.
//!
//! | Family | Shape |
//! |--------|-------|
//! | classic | rational soft clip, `k = amount·150 + 50` |
//! | blues | `tanh(0.5·k²·x·π)`, `k = amount·10` |
//! | sunshine | nested tanh / cosine, asymmetric |
//! | driver | rational clip, `amount ≤ 0.9` |
//! | sustained | asymmetric power then `tanh(2y)` |
//! | tuna4 | knee soft clip |
//! | tuna5 | fixed three-segment polynomial |
//! | tuna6 | bit-depth quantizer |
//! | chebyshev | Chebyshev recurrence with `T0 = 0` |
//!
//! ```rust
//! use stomp_core::{CurveFamily, synthesize};
//!
//! let curve = synthesize(CurveFamily::Classic, 0.5, 1024);
//! assert_eq!(curve.len(), 1025);
//! assert!(curve[512].abs() < 1e-6);
//! ```

use core::f32::consts::PI;
use core::fmt;
use core::str::FromStr;
use libm::{cosf, fabsf, floorf, powf, tanhf};

/// Curve name that does not match any family.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    /// The name is not one of the enumerated families.
    #[error("unknown curve family: {0}")]
    UnknownFamily(String),
}

/// Selectable transfer-function family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveFamily {
    /// Rational soft clip.
    Classic,
    /// Steep tanh.
    Blues,
    /// Nested tanh/cosine.
    Sunshine,
    /// Rational clip with bounded drive.
    Driver,
    /// Asymmetric power curve.
    Sustained,
    /// Knee soft clip.
    Tuna4,
    /// Fixed piecewise polynomial.
    Tuna5,
    /// Bit-depth quantizer.
    Tuna6,
    /// Chebyshev polynomial.
    Chebyshev,
}

impl CurveFamily {
    /// Every family, in declaration order.
    pub const ALL: [CurveFamily; 9] = [
        CurveFamily::Classic,
        CurveFamily::Blues,
        CurveFamily::Sunshine,
        CurveFamily::Driver,
        CurveFamily::Sustained,
        CurveFamily::Tuna4,
        CurveFamily::Tuna5,
        CurveFamily::Tuna6,
        CurveFamily::Chebyshev,
    ];

    /// Configuration name of the family.
    pub const fn name(self) -> &'static str {
        match self {
            CurveFamily::Classic => "classic",
            CurveFamily::Blues => "blues",
            CurveFamily::Sunshine => "sunshine",
            CurveFamily::Driver => "driver",
            CurveFamily::Sustained => "sustained",
            CurveFamily::Tuna4 => "tuna4",
            CurveFamily::Tuna5 => "tuna5",
            CurveFamily::Tuna6 => "tuna6",
            CurveFamily::Chebyshev => "chebyshev",
        }
    }
}

impl fmt::Display for CurveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveFamily {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurveFamily::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or_else(|| CurveError::UnknownFamily(s.to_string()))
    }
}

/// Sample `family` at `amount` into an `n + 1` point table over `[-1, 1]`.
///
/// `amount` is clamped to `[0, 1]`. `n = 0` yields the single point `f(0)`.
pub fn synthesize(family: CurveFamily, amount: f32, n: usize) -> Vec<f32> {
    let amount = crate::math::clamp(amount, 0.0, 1.0);
    if n == 0 {
        return vec![shape(family, amount, 0.0, &mut Vec::new())];
    }
    let mut scratch = Vec::new();
    (0..=n)
        .map(|i| {
            let x = i as f32 * 2.0 / n as f32 - 1.0;
            shape(family, amount, x, &mut scratch)
        })
        .collect()
}

fn shape(family: CurveFamily, amount: f32, x: f32, scratch: &mut Vec<f32>) -> f32 {
    match family {
        CurveFamily::Classic => classic(amount, x),
        CurveFamily::Blues => blues(amount, x),
        CurveFamily::Sunshine => sunshine(amount, x),
        CurveFamily::Driver => driver(amount, x),
        CurveFamily::Sustained => sustained(amount, x),
        CurveFamily::Tuna4 => knee(amount, x),
        CurveFamily::Tuna5 => three_segment(x),
        CurveFamily::Tuna6 => quantize(amount, x),
        CurveFamily::Chebyshev => chebyshev(floorf(amount * 100.0) as usize, x, scratch),
    }
}

fn classic(amount: f32, x: f32) -> f32 {
    let k = amount * 150.0 + 50.0;
    (PI + k) * x / (PI + k * fabsf(x))
}

fn blues(amount: f32, x: f32) -> f32 {
    let k = amount * 10.0;
    tanhf(0.5 * k * k * x * PI)
}

fn sunshine(amount: f32, x: f32) -> f32 {
    let k = 1.0 + amount * 9.0;
    let y = tanhf(k * x);
    tanhf(y + 0.25 * (1.0 - cosf(PI * y)))
}

fn driver(amount: f32, x: f32) -> f32 {
    let a = amount.min(0.9);
    let k = 2.0 * a / (1.0 - a);
    (1.0 + k) * x / (1.0 + k * fabsf(x))
}

fn sustained(amount: f32, x: f32) -> f32 {
    let a = 1.0 - amount;
    let y = if x < 0.0 {
        -powf(fabsf(x), a + 0.04)
    } else {
        powf(x, a)
    };
    tanhf(2.0 * y)
}

fn knee(amount: f32, x: f32) -> f32 {
    if x == 0.0 {
        return 0.0;
    }
    let a = (1.0 - amount).min(0.99);
    let abx = fabsf(x);
    let y = if abx > a {
        let over = abx - a;
        let r = over / (1.0 - a);
        a + over / (1.0 + r * r)
    } else {
        abx
    };
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    sign * y * (1.0 / ((a + 1.0) / 2.0))
}

fn three_segment(x: f32) -> f32 {
    if x < -0.08905 {
        let abx = fabsf(x);
        -0.75 * (1.0 - powf(1.0 - (abx - 0.032857), 12.0) + (abx - 0.032847) / 3.0) + 0.01
    } else if x < 0.320018 {
        -6.153 * x * x + 3.9375 * x
    } else {
        0.630035
    }
}

fn quantize(amount: f32, x: f32) -> f32 {
    let a = 1.0 + amount * 14.0;
    let bits = js_round(powf(2.0, a - 1.0));
    js_round(x * bits) / bits
}

/// Half-up rounding.
fn js_round(v: f32) -> f32 {
    floorf(v + 0.5)
}

/// `T_degree(x)` with `T0 = 0`, `T1 = x`, built bottom-up in `table`.
fn chebyshev(degree: usize, x: f32, table: &mut Vec<f32>) -> f32 {
    table.clear();
    table.push(0.0);
    table.push(x);
    for n in 2..=degree {
        let next = 2.0 * x * table[n - 1] - table[n - 2];
        table.push(next);
    }
    table[degree]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for family in CurveFamily::ALL {
            assert_eq!(family.name().parse::<CurveFamily>(), Ok(family));
            assert_eq!(family.to_string(), family.name());
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "fuzzface".parse::<CurveFamily>().unwrap_err();
        assert_eq!(err, CurveError::UnknownFamily("fuzzface".to_string()));
        assert_eq!(err.to_string(), "unknown curve family: fuzzface");
    }

    #[test]
    fn length_is_n_plus_one() {
        for family in CurveFamily::ALL {
            for n in [0, 1, 2, 255, 4096] {
                assert_eq!(synthesize(family, 0.5, n).len(), n + 1);
            }
        }
    }

    #[test]
    fn endpoints_span_unit_interval() {
        // with n = 2 the three points are x = -1, 0, 1
        let curve = synthesize(CurveFamily::Driver, 0.0, 2);
        assert_eq!(curve, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn classic_is_odd_and_bounded() {
        let curve = synthesize(CurveFamily::Classic, 0.7, 100);
        for i in 0..=100 {
            assert!((curve[i] + curve[100 - i]).abs() < 1e-5);
            assert!(curve[i].abs() <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn driver_caps_amount() {
        assert_eq!(
            synthesize(CurveFamily::Driver, 1.0, 64),
            synthesize(CurveFamily::Driver, 0.9, 64)
        );
        assert!(synthesize(CurveFamily::Driver, 1.0, 64).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn blues_at_zero_amount_is_silent() {
        assert!(synthesize(CurveFamily::Blues, 0.0, 32).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn tuna5_ignores_amount() {
        assert_eq!(
            synthesize(CurveFamily::Tuna5, 0.0, 128),
            synthesize(CurveFamily::Tuna5, 1.0, 128)
        );
        assert_eq!(three_segment(0.9), 0.630035);
    }

    #[test]
    fn tuna6_quantizes_to_levels() {
        // amount 0 -> one level: outputs in {-1, 0, 1}
        for v in synthesize(CurveFamily::Tuna6, 0.0, 64) {
            assert!(v == -1.0 || v == 0.0 || v == 1.0, "{v}");
        }
        // amount 1 -> 2^14 levels: almost identity
        let fine = synthesize(CurveFamily::Tuna6, 1.0, 64);
        assert!((fine[48] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn knee_zero_at_origin() {
        assert_eq!(knee(0.5, 0.0), 0.0);
        assert!(knee(0.5, 0.8) > 0.0);
        assert!(knee(0.5, -0.8) < 0.0);
    }

    #[test]
    fn chebyshev_recurrence() {
        let mut table = Vec::new();
        assert_eq!(chebyshev(0, 0.3, &mut table), 0.0);
        assert_eq!(chebyshev(1, 0.3, &mut table), 0.3);
        // T2 = 2x·T1 - T0 = 2x²
        assert!((chebyshev(2, 0.3, &mut table) - 0.18).abs() < 1e-6);
        // T3 = 2x·T2 - T1
        assert!((chebyshev(3, 0.3, &mut table) - (2.0 * 0.3 * 0.18 - 0.3)).abs() < 1e-6);
    }

    #[test]
    fn chebyshev_is_zero_at_origin() {
        for amount in [0.0, 0.013, 0.25, 0.5, 0.77, 1.0] {
            let curve = synthesize(CurveFamily::Chebyshev, amount, 200);
            assert_eq!(curve[100], 0.0, "amount {amount}");
        }
    }

    #[test]
    fn synthesis_is_deterministic() {
        for family in CurveFamily::ALL {
            assert_eq!(synthesize(family, 0.42, 300), synthesize(family, 0.42, 300));
        }
    }
}
