//! Scalar properties derived from a polar table.

use crate::table::{PolarRow, PolarTable};
use serde::{Deserialize, Serialize};
use sf_core::deg_to_rad;
use sf_core::interpolate::{binary_search, interpolate1d_at};
use tracing::warn;

/// Half-width of the angular window used for the linear lift fits (deg)
pub const LINEAR_WINDOW_DEG: f64 = 8.0;

/// Relative drop of the local lift slope that marks static stall
pub const STALL_SLOPE_TOLERANCE: f64 = 0.5;

/// The five scalars the stall models read from the static data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedScalars {
    /// Static stall angle (deg)
    pub static_stall_angle_deg: f64,
    /// Drag coefficient at zero lift
    pub zero_lift_drag: f64,
    /// Angle of attack at zero lift (deg)
    pub zero_lift_angle_deg: f64,
    /// Moment coefficient at zero lift
    pub zero_lift_moment: f64,
    /// Slope of the normal force coefficient (1/rad)
    pub normal_coeff_slope: f64,
}

impl DerivedScalars {
    /// Analyze a table.
    pub fn analyze(table: &PolarTable) -> Self {
        let (zero_lift_angle_deg, zero_lift_drag, zero_lift_moment) = zero_lift(table);
        let window = linear_window(table, zero_lift_angle_deg);
        let normal_coeff_slope = normal_coeff_slope(&window);
        let static_stall_angle_deg = static_stall_angle(table, zero_lift_angle_deg, &window);
        Self {
            static_stall_angle_deg,
            zero_lift_drag,
            zero_lift_angle_deg,
            zero_lift_moment,
            normal_coeff_slope,
        }
    }

    pub fn static_stall_angle_rad(&self) -> f64 {
        deg_to_rad(self.static_stall_angle_deg)
    }

    pub fn zero_lift_angle_rad(&self) -> f64 {
        deg_to_rad(self.zero_lift_angle_deg)
    }

    /// Field-wise linear blend, `t = 0` gives `self`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + t * (b - a);
        Self {
            static_stall_angle_deg: mix(self.static_stall_angle_deg, other.static_stall_angle_deg),
            zero_lift_drag: mix(self.zero_lift_drag, other.zero_lift_drag),
            zero_lift_angle_deg: mix(self.zero_lift_angle_deg, other.zero_lift_angle_deg),
            zero_lift_moment: mix(self.zero_lift_moment, other.zero_lift_moment),
            normal_coeff_slope: mix(self.normal_coeff_slope, other.normal_coeff_slope),
        }
    }
}

/// Least-squares line through `(x, y)`; `None` when x has no spread.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let x_mean = xs[..n].iter().sum::<f64>() / n as f64;
    let y_mean = ys[..n].iter().sum::<f64>() / n as f64;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        sxy += (x - x_mean) * (y - y_mean);
        sxx += (x - x_mean) * (x - x_mean);
    }
    if sxx <= f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, y_mean - slope * x_mean))
}

/// Locate the lift sign change nearest 0 deg and read drag/moment there.
fn zero_lift(table: &PolarTable) -> (f64, f64, f64) {
    let alpha = table.angles();
    let cl = table.lift();
    let n = table.len();
    let start = nearest_index(alpha, 0.0);

    let crossing = |i: usize| -> Option<f64> {
        if i + 1 >= n {
            return None;
        }
        let (a, b) = (cl[i], cl[i + 1]);
        if a == 0.0 {
            return Some(alpha[i]);
        }
        if a * b <= 0.0 {
            let frac = a / (a - b);
            return Some(alpha[i] + frac * (alpha[i + 1] - alpha[i]));
        }
        None
    };

    let mut found = None;
    for k in 0..n {
        let up = start + k;
        if let Some(a) = crossing(up) {
            found = Some(a);
            break;
        }
        if let Some(down) = start.checked_sub(k + 1) {
            if let Some(a) = crossing(down) {
                found = Some(a);
                break;
            }
        }
    }

    let angle = found.unwrap_or_else(|| {
        let i = (0..n)
            .min_by(|a, b| cl[*a].abs().total_cmp(&cl[*b].abs()))
            .unwrap_or(0);
        warn!(
            "No zero-lift crossing in polar table; using {} deg (|CL| = {})",
            alpha[i],
            cl[i].abs()
        );
        alpha[i]
    });

    let i = binary_search(alpha, angle);
    (
        angle,
        interpolate1d_at(angle, alpha, table.drag(), i),
        interpolate1d_at(angle, alpha, table.moment(), i),
    )
}

/// Rows near the zero-lift angle used for the linear fits.
///
/// Falls back to the two rows bracketing the zero-lift angle on coarse tables.
fn linear_window(table: &PolarTable, alpha0_deg: f64) -> Vec<PolarRow> {
    let rows = table.rows_between(alpha0_deg - LINEAR_WINDOW_DEG, alpha0_deg + LINEAR_WINDOW_DEG);
    if rows.len() >= 2 {
        return rows;
    }
    let i = binary_search(table.angles(), alpha0_deg);
    vec![table.row(i), table.row(i + 1)]
}

fn normal_coeff_slope(window: &[PolarRow]) -> f64 {
    let xs: Vec<f64> = window.iter().map(|r| deg_to_rad(r.alpha_deg)).collect();
    let ys: Vec<f64> = window.iter().map(PolarRow::cn).collect();
    match linear_fit(&xs, &ys) {
        Some((slope, _)) => slope,
        None => {
            warn!("Degenerate normal force window; using thin airfoil slope 2π");
            2.0 * std::f64::consts::PI
        }
    }
}

/// First row above the zero-lift angle where the local lift slope falls
/// below `(1 - STALL_SLOPE_TOLERANCE)` times the linear-range slope.
fn static_stall_angle(table: &PolarTable, alpha0_deg: f64, window: &[PolarRow]) -> f64 {
    let alpha = table.angles();
    let cl = table.lift();
    let n = table.len();

    let xs: Vec<f64> = window.iter().map(|r| r.alpha_deg).collect();
    let ys: Vec<f64> = window.iter().map(|r| r.cl).collect();
    let slope_linear = linear_fit(&xs, &ys).map(|(s, _)| s).unwrap_or(0.0);

    let start = binary_search(alpha, alpha0_deg);
    if slope_linear > 0.0 {
        let threshold = (1.0 - STALL_SLOPE_TOLERANCE) * slope_linear;
        for i in start..n - 1 {
            let local = (cl[i + 1] - cl[i]) / (alpha[i + 1] - alpha[i]);
            if local < threshold && alpha[i] > alpha0_deg {
                return alpha[i];
            }
        }
        return alpha[n - 1];
    }

    // No usable linear range: fall back to the lift peak above zero lift
    let peak = (start..n)
        .filter(|i| alpha[*i] > alpha0_deg)
        .max_by(|a, b| cl[*a].total_cmp(&cl[*b]))
        .unwrap_or(n - 1);
    warn!(
        "Lift curve has no positive linear range; static stall taken at CL peak {} deg",
        alpha[peak]
    );
    alpha[peak]
}

fn nearest_index(list: &[f64], value: f64) -> usize {
    (0..list.len())
        .min_by(|a, b| (list[*a] - value).abs().total_cmp(&(list[*b] - value).abs()))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Thin-airfoil-like polar, linear to 12 deg then dropping.
    fn smooth_table() -> PolarTable {
        let rows: Vec<PolarRow> = (-20..=20)
            .map(|a| {
                let a = a as f64;
                let cl = if a.abs() <= 12.0 {
                    0.11 * a
                } else {
                    a.signum() * (1.32 - 0.05 * (a.abs() - 12.0))
                };
                PolarRow::new(a, cl, 0.008 + 0.0002 * a * a, -0.002 * a)
            })
            .collect();
        PolarTable::new(rows).unwrap()
    }

    #[test]
    fn scenario_table_scalars() {
        let table = PolarTable::new(vec![
            [-10.0, -1.0, 0.02, 0.0],
            [0.0, 0.0, 0.01, 0.0],
            [10.0, 1.0, 0.02, 0.0],
            [20.0, 0.8, 0.2, 0.0],
        ])
        .unwrap();
        let d = DerivedScalars::analyze(&table);
        assert_eq!(d.zero_lift_angle_deg, 0.0);
        assert!((d.zero_lift_drag - 0.01).abs() < 1e-12);
        assert_eq!(d.static_stall_angle_deg, 10.0);
        assert!(d.normal_coeff_slope > 5.0 && d.normal_coeff_slope < 6.5);
    }

    #[test]
    fn smooth_table_scalars() {
        let d = DerivedScalars::analyze(&smooth_table());
        assert!(d.zero_lift_angle_deg.abs() < 1e-12);
        assert!((d.zero_lift_drag - 0.008).abs() < 1e-12);
        assert_eq!(d.static_stall_angle_deg, 12.0);
        // 0.11 per degree is 6.30 per radian
        assert!((d.normal_coeff_slope - 0.11 * 180.0 / PI).abs() < 0.1);
    }

    #[test]
    fn cambered_zero_lift_angle() {
        let table = PolarTable::new(vec![
            [-8.0, -0.6, 0.012, -0.05],
            [-4.0, -0.2, 0.010, -0.05],
            [0.0, 0.2, 0.010, -0.05],
            [4.0, 0.6, 0.011, -0.05],
        ])
        .unwrap();
        let d = DerivedScalars::analyze(&table);
        assert!((d.zero_lift_angle_deg + 2.0).abs() < 1e-12);
        assert!((d.zero_lift_drag - 0.010).abs() < 1e-12);
        assert!((d.zero_lift_moment + 0.05).abs() < 1e-12);
    }

    #[test]
    fn lerp_endpoints() {
        let a = DerivedScalars::analyze(&smooth_table());
        let mut b = a;
        b.zero_lift_drag = 0.02;
        assert_eq!(a.lerp(&b, 0.0), a);
        assert!((a.lerp(&b, 1.0).zero_lift_drag - 0.02).abs() < 1e-12);
        assert!((a.lerp(&b, 0.5).zero_lift_drag - 0.014).abs() < 1e-12);
    }

    #[test]
    fn linear_fit_exact_line() {
        let (slope, intercept) = linear_fit(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
        assert!(linear_fit(&[1.0, 1.0], &[0.0, 2.0]).is_none());
    }
}
