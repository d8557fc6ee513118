//! Constants fitted to the static polar, per Reynolds number.
//!
//! Each source table of the profile gets its own [`StaticConstants`]; the
//! model interpolates them with the same Reynolds bracket the profile uses
//! for its lookups.

use crate::config::{KirchhoffFit, StallConfig};
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use sf_core::{SMALL, deg_to_rad, rad_to_deg};
use sf_profile::{DerivedScalars, PolarRow, PolarTable, ProfileData};
use std::f64::consts::PI;
use tracing::warn;

/// Separation scale below the stall angle when the table gives nothing to fit (rad)
pub const DEFAULT_S1: f64 = 0.04;
/// Separation scale above the stall angle when the table gives nothing to fit (rad)
pub const DEFAULT_S2: f64 = 0.05;

const MIN_SCALE: f64 = 1e-3;
const MAX_SCALE: f64 = 0.5;

/// Rows above the stall angle used for the separated-flow fit (deg)
const SEPARATED_FIT_SPAN_DEG: f64 = 40.0;
/// Grid spacing of the interpolated polar samples in the separation fit (deg)
const FIT_SAMPLE_STEP_DEG: f64 = 0.5;
/// Keeps inverted separation points off the ends of the fit's log domain
const F_LIMIT: f64 = 1e-6;
/// Rows above the stall angle used for the moment fit (deg)
const MOMENT_FIT_SPAN_DEG: f64 = 20.0;

/// Static constants read by the models. Angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StaticConstants {
    pub alpha_ss: f64,
    /// Break point of the separation fit
    pub alpha1: f64,
    pub alpha0: f64,
    /// Normal force slope (1/rad)
    pub cn_alpha: f64,
    /// Critical normal force for leading-edge separation
    pub cn1: f64,
    pub cd0: f64,
    pub cm0: f64,
    pub s1: f64,
    pub s2: f64,
    pub k1: f64,
    pub k2: f64,
}

impl StaticConstants {
    /// Fit the constants to one table.
    pub fn fit(
        table: &PolarTable,
        derived: &DerivedScalars,
        fit: KirchhoffFit,
        config: &StallConfig,
    ) -> Self {
        let alpha_ss = derived.static_stall_angle_rad();
        let alpha0 = derived.zero_lift_angle_rad();
        let cn_alpha = derived.normal_coeff_slope;
        let (s1, s2) = fit_separation_scales(table, alpha0, alpha_ss, cn_alpha, fit);

        let mut constants = Self {
            alpha_ss,
            alpha1: alpha_ss,
            alpha0,
            cn_alpha,
            cn1: cn_alpha * (alpha_ss - alpha0) * kirchhoff_factor(1.0 - fit.b),
            cd0: derived.zero_lift_drag,
            cm0: derived.zero_lift_moment,
            s1,
            s2,
            k1: 0.0,
            k2: 0.0,
        };
        let (k1, k2) = fit_moment(table, &constants, fit, config);
        constants.k1 = k1;
        constants.k2 = k2;
        constants
    }

    /// Separation point at `|α|` with break point `alpha1`.
    pub fn separation(&self, alpha_abs: f64, alpha1: f64, fit: KirchhoffFit) -> f64 {
        separation_point(alpha_abs, alpha1, self.s1, self.s2, fit)
    }

    /// Normal force the model settles to when `α` is held.
    pub fn steady_normal(&self, alpha: f64, fit: KirchhoffFit) -> f64 {
        let f = self.separation(alpha.abs(), self.alpha1, fit);
        self.cn_alpha * (alpha - self.alpha0) * kirchhoff_factor(f)
    }

    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + t * (b - a);
        Self {
            alpha_ss: mix(self.alpha_ss, other.alpha_ss),
            alpha1: mix(self.alpha1, other.alpha1),
            alpha0: mix(self.alpha0, other.alpha0),
            cn_alpha: mix(self.cn_alpha, other.cn_alpha),
            cn1: mix(self.cn1, other.cn1),
            cd0: mix(self.cd0, other.cd0),
            cm0: mix(self.cm0, other.cm0),
            s1: mix(self.s1, other.s1),
            s2: mix(self.s2, other.s2),
            k1: mix(self.k1, other.k1),
            k2: mix(self.k2, other.k2),
        }
    }
}

/// Kirchhoff lift factor `((1 + √f) / 2)²`.
#[inline]
pub fn kirchhoff_factor(f: f64) -> f64 {
    let r = (1.0 + f.max(0.0).sqrt()) / 2.0;
    r * r
}

/// Exponential separation-point fit, clamped to `[0, 1]`.
pub fn separation_point(alpha_abs: f64, alpha1: f64, s1: f64, s2: f64, fit: KirchhoffFit) -> f64 {
    let f = if alpha_abs < alpha1 {
        1.0 - fit.b * ((alpha_abs - alpha1) / s1).exp()
    } else {
        fit.c + fit.d * ((alpha1 - alpha_abs) / s2).exp()
    };
    f.clamp(0.0, 1.0)
}

/// Separation point implied by a static normal force, from the Kirchhoff
/// relation. `None` where the attached-flow force vanishes.
pub fn invert_kirchhoff(cn: f64, cn_alpha: f64, alpha: f64, alpha0: f64) -> Option<f64> {
    let attached = cn_alpha * (alpha - alpha0);
    if attached.abs() < SMALL {
        return None;
    }
    let ratio = (cn / attached).max(0.0);
    let root = (2.0 * ratio.sqrt() - 1.0).clamp(0.0, 1.0);
    Some(root * root)
}

/// Moment offset model `CN (K0 + K1 (1 - f) + K2 sin(π f^m))`.
#[inline]
pub fn moment_fit(cn: f64, f: f64, k0: f64, k1: f64, k2: f64, exponent: f64) -> f64 {
    let f = f.clamp(0.0, 1.0);
    cn * (k0 + k1 * (1.0 - f) + k2 * (PI * f.powf(exponent)).sin())
}

/// Least-squares `S1` and `S2` in log space, through the origin.
///
/// The interpolated polar is sampled on a fixed grid as well as at its
/// rows, so a coarse table still constrains the attached branch. Fully
/// attached samples are held just below `f = 1` and drive `S1` small
/// rather than being dropped.
fn fit_separation_scales(
    table: &PolarTable,
    alpha0: f64,
    alpha1: f64,
    cn_alpha: f64,
    fit: KirchhoffFit,
) -> (f64, f64) {
    let upper = alpha1 + deg_to_rad(SEPARATED_FIT_SPAN_DEG);
    let mut attached = LogFit::default();
    let mut separated = LogFit::default();

    for alpha_deg in fit_angles(table, rad_to_deg(alpha0), rad_to_deg(upper)) {
        let alpha = deg_to_rad(alpha_deg);
        let c = table.lookup(alpha_deg);
        let cn = PolarRow::new(alpha_deg, c.cl, c.cd, c.cm).cn();
        let Some(f) = invert_kirchhoff(cn, cn_alpha, alpha, alpha0) else {
            continue;
        };
        if alpha < alpha1 {
            let q = (1.0 - f.min(1.0 - F_LIMIT)) / fit.b;
            attached.add(alpha - alpha1, q);
        } else if alpha > alpha1 && f > fit.c {
            // at or below the floor `c` the sample carries no scale
            let q = (f - fit.c) / fit.d;
            separated.add(alpha1 - alpha, q);
        }
    }

    (
        attached.scale(DEFAULT_S1, "S1"),
        separated.scale(DEFAULT_S2, "S2"),
    )
}

/// Sample angles in `(start_deg, stop_deg]`: table rows plus a fixed grid.
fn fit_angles(table: &PolarTable, start_deg: f64, stop_deg: f64) -> Vec<f64> {
    let mut angles: Vec<f64> = table
        .angles()
        .iter()
        .copied()
        .filter(|a| *a > start_deg && *a <= stop_deg)
        .collect();
    let mut a = start_deg + FIT_SAMPLE_STEP_DEG;
    while a <= stop_deg {
        angles.push(a);
        a += FIT_SAMPLE_STEP_DEG;
    }
    angles.sort_by(f64::total_cmp);
    angles.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    angles
}

/// Running sums for `ln q = x / S`.
#[derive(Debug, Default)]
struct LogFit {
    samples: usize,
    sxx: f64,
    sxy: f64,
}

impl LogFit {
    fn add(&mut self, x: f64, q: f64) {
        let q = q.clamp(F_LIMIT, 1.0 - F_LIMIT);
        self.samples += 1;
        self.sxx += x * x;
        self.sxy += x * q.ln();
    }

    fn scale(&self, fallback: f64, what: &str) -> f64 {
        if self.samples == 0 {
            warn!("No rows to fit separation scale {what}; using {fallback} rad");
            fallback
        } else if self.sxy > SMALL {
            (self.sxx / self.sxy).clamp(MIN_SCALE, MAX_SCALE)
        } else {
            MAX_SCALE
        }
    }
}

/// Least-squares `K1`, `K2` against the static moment above zero lift.
fn fit_moment(
    table: &PolarTable,
    constants: &StaticConstants,
    fit: KirchhoffFit,
    config: &StallConfig,
) -> (f64, f64) {
    let upper = constants.alpha1 + deg_to_rad(MOMENT_FIT_SPAN_DEG);
    let mut normal = Matrix2::<f64>::zeros();
    let mut rhs = Vector2::<f64>::zeros();

    for row in table.rows() {
        let alpha = deg_to_rad(row.alpha_deg);
        if alpha <= constants.alpha0 || alpha > upper {
            continue;
        }
        let cn = row.cn();
        let f = constants.separation(alpha, constants.alpha1, fit);
        let basis = Vector2::new(
            cn * (1.0 - f),
            cn * (PI * f.powf(config.cm_exponent)).sin(),
        );
        let target = row.cm - constants.cm0 - config.k0 * cn;
        normal += basis * basis.transpose();
        rhs += basis * target;
    }

    let scale = normal.norm();
    if scale > SMALL && normal.determinant().abs() > 1e-12 * scale * scale {
        if let Some(k) = normal.lu().solve(&rhs) {
            if k.iter().all(|v| v.is_finite()) {
                return (k[0], k[1]);
            }
        }
    }
    warn!("Moment fit is degenerate for this table; using K1 = K2 = 0");
    (0.0, 0.0)
}

/// Per-table constants plus the set interpolated at the live Reynolds number.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticCache {
    per_table: Vec<StaticConstants>,
    active: StaticConstants,
}

impl StaticCache {
    pub fn build(profile: &ProfileData, fit: KirchhoffFit, config: &StallConfig) -> Self {
        let per_table: Vec<StaticConstants> = profile
            .tables()
            .iter()
            .zip(profile.derived_list())
            .map(|(t, d)| StaticConstants::fit(&t.table, d, fit, config))
            .collect();
        let active = interpolate(&per_table, profile.re_bracket());
        Self { per_table, active }
    }

    /// Re-interpolate for a new Reynolds bracket.
    pub fn refresh(&mut self, bracket: (usize, f64)) {
        self.active = interpolate(&self.per_table, bracket);
    }

    pub fn active(&self) -> &StaticConstants {
        &self.active
    }

    pub fn per_table(&self) -> &[StaticConstants] {
        &self.per_table
    }
}

fn interpolate(list: &[StaticConstants], (index, frac): (usize, f64)) -> StaticConstants {
    match list.len() {
        0 => StaticConstants::default(),
        1 => list[0],
        n => {
            let i = index.min(n - 2);
            list[i].lerp(&list[i + 1], frac)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stalling_table() -> PolarTable {
        // thin airfoil lift up to 12 deg, then a Kirchhoff-shaped drop
        let fit = KirchhoffFit::CLASSIC;
        let cn_alpha = 2.0 * PI;
        let alpha1 = deg_to_rad(12.0);
        let rows: Vec<[f64; 4]> = (0..=30)
            .map(|a| {
                let a = a as f64;
                let alpha = deg_to_rad(a);
                let f = separation_point(alpha, alpha1, 0.03, 0.06, fit);
                let cn = cn_alpha * alpha * kirchhoff_factor(f);
                let cm = -0.1 * cn * (1.0 - f);
                // pure normal force: cl = cn cos, cd = cn sin
                [a, cn * alpha.cos(), 0.01 + cn * alpha.sin(), cm]
            })
            .collect();
        let mut with_negative: Vec<[f64; 4]> = rows
            .iter()
            .skip(1)
            .rev()
            .map(|r| [-r[0], -r[1], r[2], -r[3]])
            .collect();
        with_negative.extend(rows);
        PolarTable::new(with_negative).unwrap()
    }

    #[test]
    fn factor_limits() {
        assert_eq!(kirchhoff_factor(1.0), 1.0);
        assert_eq!(kirchhoff_factor(0.0), 0.25);
        assert_eq!(kirchhoff_factor(-0.5), 0.25);
    }

    #[test]
    fn separation_is_continuous_at_break() {
        let fit = KirchhoffFit::CLASSIC;
        let below = separation_point(0.2 - 1e-12, 0.2, 0.04, 0.05, fit);
        let above = separation_point(0.2, 0.2, 0.04, 0.05, fit);
        assert!((below - (1.0 - fit.b)).abs() < 1e-9);
        assert!((above - (fit.c + fit.d)).abs() < 1e-12);
    }

    #[test]
    fn inversion_recovers_separation() {
        let f = 0.49;
        let cn = 5.0 * 0.2 * kirchhoff_factor(f);
        let back = invert_kirchhoff(cn, 5.0, 0.2, 0.0).unwrap();
        assert!((back - f).abs() < 1e-12);
        assert!(invert_kirchhoff(0.1, 5.0, 0.0, 0.0).is_none());
    }

    #[test]
    fn moment_fit_shape() {
        assert_eq!(moment_fit(1.0, 1.0, 0.0, 0.5, 0.0, 2.0), 0.0);
        assert!((moment_fit(2.0, 0.0, 0.1, 0.5, 0.3, 2.0) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn fits_recover_generating_scales() {
        let table = stalling_table();
        let derived = DerivedScalars::analyze(&table);
        let config = StallConfig::new(1.0);
        let k = StaticConstants::fit(&table, &derived, KirchhoffFit::CLASSIC, &config);

        assert!(k.alpha0.abs() < 1e-9);
        assert!(k.cn_alpha > 5.5 && k.cn_alpha < 6.6);
        assert!(k.s1 > MIN_SCALE && k.s1 < MAX_SCALE);
        assert!(k.s2 > MIN_SCALE && k.s2 < MAX_SCALE);
        assert!(k.cn1 > 0.0 && k.cn1 < k.cn_alpha * k.alpha_ss);
        // moment was generated with K1 = -0.1, K2 = 0
        assert!(k.k1 < 0.0);
    }

    #[test]
    fn linear_polar_fits_a_sharp_attached_scale() {
        let table = PolarTable::new(vec![
            [-10.0, -1.0, 0.02, 0.0],
            [0.0, 0.0, 0.01, 0.0],
            [10.0, 1.0, 0.02, 0.0],
        ])
        .unwrap();
        let derived = DerivedScalars::analyze(&table);
        let fit = KirchhoffFit::CLASSIC;
        let k = StaticConstants::fit(&table, &derived, fit, &StallConfig::new(1.0));

        // no row strictly between zero lift and stall, the grid still fits S1
        assert!(k.s1 < 0.25 * DEFAULT_S1, "s1 = {}", k.s1);
        // nothing above stall
        assert_eq!(k.s2, DEFAULT_S2);
        assert_eq!((k.k1, k.k2), (0.0, 0.0));

        // linear lift is reproduced within 1% up to 80% of stall
        for frac in [0.2, 0.5, 0.8] {
            let alpha = frac * k.alpha_ss;
            let ratio = k.steady_normal(alpha, fit) / (k.cn_alpha * (alpha - k.alpha0));
            assert!(ratio > 0.99, "alpha = {alpha}, ratio = {ratio}");
        }
    }

    #[test]
    fn fully_attached_samples_are_kept() {
        // a sample at or above the attached line inverts to f = 1
        let mut fit = LogFit::default();
        fit.add(-0.1, (1.0 - 1.0_f64.min(1.0 - F_LIMIT)) / 0.3);
        assert_eq!(fit.samples, 1);
        assert!(fit.scale(DEFAULT_S1, "S1") < 0.01);
        assert_eq!(LogFit::default().scale(DEFAULT_S2, "S2"), DEFAULT_S2);
    }

    #[test]
    fn steady_normal_matches_attached_slope() {
        let table = stalling_table();
        let derived = DerivedScalars::analyze(&table);
        let fit = KirchhoffFit::CLASSIC;
        let k = StaticConstants::fit(&table, &derived, fit, &StallConfig::new(1.0));
        let alpha = deg_to_rad(2.0);
        let cn = k.steady_normal(alpha, fit);
        assert!(cn > 0.9 * k.cn_alpha * alpha && cn <= k.cn_alpha * alpha);
        assert!((k.steady_normal(-alpha, fit) + cn).abs() < 1e-12);
    }

    #[test]
    fn cache_interpolates_between_tables() {
        let low = stalling_table();
        let rows: Vec<[f64; 4]> = low
            .rows()
            .map(|r| [r.alpha_deg, 1.2 * r.cl, r.cd, r.cm])
            .collect();
        let high = PolarTable::new(rows).unwrap();
        let profile = ProfileData::with_reynolds(
            "fam",
            vec![
                sf_profile::ReynoldsTable::new(1e5, low),
                sf_profile::ReynoldsTable::new(1e6, high),
            ],
            1e5,
            true,
        )
        .unwrap();
        let config = StallConfig::new(1.0);
        let mut cache = StaticCache::build(&profile, KirchhoffFit::CLASSIC, &config);
        assert_eq!(cache.active(), &cache.per_table()[0]);

        cache.refresh((0, 0.5));
        let expected = cache.per_table()[0].lerp(&cache.per_table()[1], 0.5);
        assert_eq!(cache.active(), &expected);
        assert!(cache.active().cn_alpha > cache.per_table()[0].cn_alpha);
    }
}
