//! Deterministic fixed-point numbers for the thermal simulation, and the
//! tick counter.
//!
//! Resource amounts are integers (`u64`). Temperatures, coefficients and
//! converted work are fractional and use [`Fixed64`] so a tick gives the same
//! result on every platform.

use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Simulation time, counted in ticks.
pub type Ticks = u64;

/// Build a Fixed64 from a config value. Out-of-range input saturates.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::saturating_from_num(v)
}

/// For display only.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// `a / b`, or `None` when `b` is zero or the quotient overflows.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

/// The whole units in a non-negative amount, rounding down. Negative
/// amounts have none.
#[inline]
pub fn whole_units(v: Fixed64) -> u64 {
    if v <= Fixed64::ZERO {
        0
    } else {
        v.to_num::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_values_round_trip() {
        assert_eq!(fixed64_to_f64(f64_to_fixed64(1.5) + f64_to_fixed64(2.0)), 3.5);
        assert_eq!(f64_to_fixed64(1.0e12), Fixed64::MAX);
    }

    #[test]
    fn carnot_quarter_is_exact() {
        let t = Fixed64::from_num(100);
        let ambient = Fixed64::from_num(300);
        assert_eq!(checked_div_64(t, t + ambient), Some(f64_to_fixed64(0.25)));
    }

    #[test]
    fn zero_divisor_is_none() {
        assert!(checked_div_64(Fixed64::ONE, Fixed64::ZERO).is_none());
    }

    #[test]
    fn whole_units_round_down() {
        assert_eq!(whole_units(f64_to_fixed64(12.5)), 12);
        assert_eq!(whole_units(f64_to_fixed64(0.999)), 0);
        assert_eq!(whole_units(f64_to_fixed64(-3.0)), 0);
    }
}
