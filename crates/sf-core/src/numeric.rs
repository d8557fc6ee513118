use crate::SfError;

/// Floating point type used throughout system
pub type Real = f64;

/// Guard used before dividing by a quantity that may vanish
/// (velocity magnitude, time step, lift slope).
pub const SMALL: Real = 1e-9;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, SfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SfError::NonFinite { what, value: v })
    }
}

/// Check that every value is finite and the sequence is strictly increasing.
pub fn ensure_strictly_increasing(values: &[Real], what: &'static str) -> Result<(), SfError> {
    for (index, v) in values.iter().enumerate() {
        ensure_finite(*v, what)?;
        if index > 0 && *v <= values[index - 1] {
            return Err(SfError::NotIncreasing { what, index });
        }
    }
    Ok(())
}

/// Divide, returning `fallback` when the denominator is within `SMALL` of zero.
#[inline]
pub fn guarded_div(num: Real, den: Real, fallback: Real) -> Real {
    if den.abs() < SMALL {
        fallback
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn strictly_increasing_rejects_repeat() {
        assert!(ensure_strictly_increasing(&[0.0, 1.0, 2.0], "angles").is_ok());
        let err = ensure_strictly_increasing(&[0.0, 1.0, 1.0], "angles").unwrap_err();
        assert_eq!(
            err,
            SfError::NotIncreasing {
                what: "angles",
                index: 2
            }
        );
        assert!(ensure_strictly_increasing(&[0.0, Real::INFINITY], "angles").is_err());
    }

    #[test]
    fn guarded_div_falls_back() {
        assert_eq!(guarded_div(1.0, 2.0, 0.0), 0.5);
        assert_eq!(guarded_div(1.0, 1e-12, -3.0), -3.0);
    }
}
