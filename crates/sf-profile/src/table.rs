//! Polar tables.

use crate::conversion::{to_chordwise, to_normal};
use crate::error::{ProfileError, ProfileResult};
use serde::{Deserialize, Serialize};
use sf_core::interpolate::{
    binary_search, fraction, interpolate1d_at, interpolate1d_frac, linear_search,
};
use sf_core::numeric::{ensure_finite, ensure_strictly_increasing};

/// One row of a polar: angle of attack in degrees plus static coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarRow {
    pub alpha_deg: f64,
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
}

impl PolarRow {
    pub fn new(alpha_deg: f64, cl: f64, cd: f64, cm: f64) -> Self {
        Self {
            alpha_deg,
            cl,
            cd,
            cm,
        }
    }

    /// Normal force coefficient of this row.
    pub fn cn(&self) -> f64 {
        to_normal(self.cl, self.cd, self.alpha_deg)
    }

    /// Chordwise force coefficient of this row.
    pub fn cc(&self) -> f64 {
        to_chordwise(self.cl, self.cd, self.alpha_deg)
    }
}

impl From<[f64; 4]> for PolarRow {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Static lift, drag and moment coefficients at one angle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StaticCoefficients {
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
}

/// Angle-of-attack indexed static coefficients, stored column-wise.
///
/// Angles are strictly increasing and every value is finite; both are
/// checked on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarTable {
    alpha_deg: Vec<f64>,
    cl: Vec<f64>,
    cd: Vec<f64>,
    cm: Vec<f64>,
}

impl PolarTable {
    /// Build a table from rows.
    ///
    /// # Errors
    /// Fewer than two rows, non-finite values, or angles that are not
    /// strictly increasing.
    pub fn new<I, R>(rows: I) -> ProfileResult<Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<PolarRow>,
    {
        let rows: Vec<PolarRow> = rows.into_iter().map(Into::into).collect();
        Self::from_columns(
            rows.iter().map(|r| r.alpha_deg).collect(),
            rows.iter().map(|r| r.cl).collect(),
            rows.iter().map(|r| r.cd).collect(),
            rows.iter().map(|r| r.cm).collect(),
        )
    }

    /// Build a table from columns of equal length.
    pub fn from_columns(
        alpha_deg: Vec<f64>,
        cl: Vec<f64>,
        cd: Vec<f64>,
        cm: Vec<f64>,
    ) -> ProfileResult<Self> {
        let n = alpha_deg.len();
        if cl.len() != n || cd.len() != n || cm.len() != n {
            return Err(ProfileError::LengthMismatch {
                what: "coefficient columns must match the angle list",
            });
        }
        if n < 2 {
            return Err(ProfileError::TooFewRows {
                what: "polar table",
                rows: n,
            });
        }
        ensure_strictly_increasing(&alpha_deg, "angle of attack")?;
        for ((l, d), m) in cl.iter().zip(&cd).zip(&cm) {
            ensure_finite(*l, "lift coefficient")?;
            ensure_finite(*d, "drag coefficient")?;
            ensure_finite(*m, "moment coefficient")?;
        }
        Ok(Self {
            alpha_deg,
            cl,
            cd,
            cm,
        })
    }

    pub fn len(&self) -> usize {
        self.alpha_deg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha_deg.is_empty()
    }

    pub fn angles(&self) -> &[f64] {
        &self.alpha_deg
    }

    pub fn lift(&self) -> &[f64] {
        &self.cl
    }

    pub fn drag(&self) -> &[f64] {
        &self.cd
    }

    pub fn moment(&self) -> &[f64] {
        &self.cm
    }

    pub fn row(&self, i: usize) -> PolarRow {
        PolarRow::new(self.alpha_deg[i], self.cl[i], self.cd[i], self.cm[i])
    }

    pub fn rows(&self) -> impl Iterator<Item = PolarRow> + '_ {
        (0..self.len()).map(|i| self.row(i))
    }

    /// Rows whose angle lies in `[start_deg, stop_deg]`.
    pub fn rows_between(&self, start_deg: f64, stop_deg: f64) -> Vec<PolarRow> {
        self.rows()
            .filter(|r| r.alpha_deg >= start_deg && r.alpha_deg <= stop_deg)
            .collect()
    }

    /// Interpolated coefficients, held at the table ends.
    pub fn lookup(&self, alpha_deg: f64) -> StaticCoefficients {
        let i = binary_search(&self.alpha_deg, alpha_deg);
        let frac = fraction(alpha_deg, &self.alpha_deg, i);
        StaticCoefficients {
            cl: interpolate1d_frac(frac, &self.cl, i),
            cd: interpolate1d_frac(frac, &self.cd, i),
            cm: interpolate1d_frac(frac, &self.cm, i),
        }
    }

    /// Table sampled on another (increasing) angle grid.
    pub(crate) fn resampled_columns(&self, angles: &[f64]) -> [Vec<f64>; 3] {
        let sample = |col: &[f64]| -> Vec<f64> {
            let mut i = 0;
            angles
                .iter()
                .map(|a| {
                    i = linear_search(&self.alpha_deg, *a, i);
                    interpolate1d_at(*a, &self.alpha_deg, col, i)
                })
                .collect()
        };
        [sample(&self.cl), sample(&self.cd), sample(&self.cm)]
    }
}

/// Polar table measured at one Reynolds number.
#[derive(Debug, Clone, PartialEq)]
pub struct ReynoldsTable {
    pub reynolds: f64,
    pub table: PolarTable,
}

impl ReynoldsTable {
    pub fn new(reynolds: f64, table: PolarTable) -> Self {
        Self { reynolds, table }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_table() -> PolarTable {
        PolarTable::new(vec![
            [-10.0, -1.0, 0.02, 0.01],
            [0.0, 0.0, 0.01, 0.0],
            [10.0, 1.0, 0.02, -0.01],
            [20.0, 0.8, 0.2, -0.05],
        ])
        .unwrap()
    }

    #[test]
    fn lookup_interpolates_all_columns() {
        let t = scenario_table();
        let c = t.lookup(5.0);
        assert!((c.cl - 0.5).abs() < 1e-12);
        assert!((c.cd - 0.015).abs() < 1e-12);
        assert!((c.cm + 0.005).abs() < 1e-12);
    }

    #[test]
    fn lookup_clamps_out_of_range() {
        let t = scenario_table();
        assert_eq!(t.lookup(45.0).cl, 0.8);
        assert_eq!(t.lookup(-45.0).cl, -1.0);
    }

    #[test]
    fn rejects_non_monotonic_angles() {
        let err = PolarTable::new(vec![[0.0, 0.0, 0.01, 0.0], [0.0, 0.1, 0.01, 0.0]]).unwrap_err();
        assert!(matches!(err, ProfileError::Core(_)));
    }

    #[test]
    fn rejects_single_row() {
        let err = PolarTable::new(vec![[0.0, 0.0, 0.01, 0.0]]).unwrap_err();
        assert_eq!(
            err,
            ProfileError::TooFewRows {
                what: "polar table",
                rows: 1
            }
        );
    }

    #[test]
    fn rejects_non_finite_coefficients() {
        let err = PolarTable::new(vec![[0.0, f64::NAN, 0.01, 0.0], [1.0, 0.1, 0.01, 0.0]])
            .unwrap_err();
        assert!(err.to_string().contains("lift coefficient"));
    }

    #[test]
    fn rows_between_is_inclusive() {
        let t = scenario_table();
        let rows = t.rows_between(0.0, 10.0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].alpha_deg, 0.0);
        assert_eq!(rows[1].alpha_deg, 10.0);
    }
}
