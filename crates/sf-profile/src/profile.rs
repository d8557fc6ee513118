//! The static-data provider consumed by the dynamic stall models.

use crate::conversion::{to_chordwise, to_normal};
use crate::derived::DerivedScalars;
use crate::error::{ProfileError, ProfileResult};
use crate::table::{PolarRow, PolarTable, ReynoldsTable, StaticCoefficients};
use serde::{Deserialize, Serialize};
use sf_core::interpolate::{binary_search, fraction, interpolate2d_frac};
use sf_core::numeric::{Tolerances, ensure_strictly_increasing, nearly_equal};
use tracing::{debug, warn};

/// Relative change of Reynolds number that triggers a cache rebuild
pub const RE_TOLERANCE: f64 = 1e-6;
/// Exponent of the angle scaling `(Re / Re_ref)^n` for a single table
pub const RE_ANGLE_EXPONENT: f64 = 0.08;
/// Exponent of the drag scaling `(Re_ref / Re)^n` for a single table
pub const RE_DRAG_EXPONENT: f64 = 0.2;

fn default_reynolds() -> f64 {
    1e6
}

/// Serializable description of a profile, as read from a case file.
///
/// Rows are `[alpha_deg, cl, cd, cm]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<[f64; 4]>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reynolds_tables: Vec<ReynoldsTableDef>,
    #[serde(default = "default_reynolds")]
    pub reynolds: f64,
    #[serde(default)]
    pub correct_re: bool,
    /// Reynolds number a single `table` was measured at. With `correct_re`
    /// the table is rescaled to the live Reynolds number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_reynolds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReynoldsTableDef {
    pub reynolds: f64,
    pub table: Vec<[f64; 4]>,
}

/// Position of the live Reynolds number in the Reynolds list, plus the
/// derived scalars interpolated there.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ReCache {
    reynolds: f64,
    index: usize,
    frac: f64,
    derived: DerivedScalars,
}

/// Unmodified single table and the Reynolds number it was measured at.
#[derive(Debug, Clone, PartialEq)]
struct ReferenceTable {
    reynolds: f64,
    original: PolarTable,
}

impl ReferenceTable {
    /// Angles scale with `(Re / Re_ref)^0.08`, drag with `(Re_ref / Re)^0.2`.
    fn rescaled(&self, reynolds: f64) -> ProfileResult<PolarTable> {
        let ratio = reynolds / self.reynolds;
        let angle_scale = ratio.powf(RE_ANGLE_EXPONENT);
        let drag_scale = ratio.powf(-RE_DRAG_EXPONENT);
        PolarTable::from_columns(
            self.original.angles().iter().map(|a| a * angle_scale).collect(),
            self.original.lift().to_vec(),
            self.original.drag().iter().map(|d| d * drag_scale).collect(),
            self.original.moment().to_vec(),
        )
    }
}

/// Static airfoil data: one polar table, or a family of tables keyed by
/// Reynolds number.
///
/// Every table of a family is resampled onto the union of all angle grids, so
/// lookups are bilinear in (angle, Reynolds). Derived scalars are computed
/// once per source table and interpolated for the live Reynolds number; the
/// interpolation is cached and only redone when the Reynolds number moves by
/// more than [`RE_TOLERANCE`] (relative).
///
/// A single table measured at a reference Reynolds number is instead
/// rescaled from its unmodified copy whenever the Reynolds number moves.
#[derive(Debug, Clone)]
pub struct ProfileData {
    name: String,
    reynolds: f64,
    correct_re: bool,
    tables: Vec<ReynoldsTable>,
    derived_list: Vec<DerivedScalars>,
    re_list: Vec<f64>,
    angles: Vec<f64>,
    // [angle][re]
    cl: Vec<Vec<f64>>,
    cd: Vec<Vec<f64>>,
    cm: Vec<Vec<f64>>,
    cache: ReCache,
    reference: Option<ReferenceTable>,
}

impl ProfileData {
    /// Profile with a single table. Reynolds corrections are inactive.
    pub fn new(name: impl Into<String>, table: PolarTable) -> Self {
        Self::single(name.into(), table, default_reynolds())
    }

    /// Single table measured at `reference_reynolds`, corrected to `reynolds`.
    ///
    /// # Errors
    /// Non-positive or non-finite Reynolds numbers.
    pub fn with_reference(
        name: impl Into<String>,
        table: PolarTable,
        reynolds: f64,
        reference_reynolds: f64,
    ) -> ProfileResult<Self> {
        for re in [reynolds, reference_reynolds] {
            if !re.is_finite() || re <= 0.0 {
                return Err(ProfileError::InvalidArg {
                    what: "Reynolds number must be positive",
                });
            }
        }
        let reference = ReferenceTable {
            reynolds: reference_reynolds,
            original: table,
        };
        let mut profile = Self::single(name.into(), reference.rescaled(reynolds)?, reynolds);
        profile.correct_re = true;
        profile.reference = Some(reference);
        Ok(profile)
    }

    fn single(name: String, table: PolarTable, reynolds: f64) -> Self {
        let derived = DerivedScalars::analyze(&table);
        let angles = table.angles().to_vec();
        let column = |col: &[f64]| col.iter().map(|v| vec![*v]).collect::<Vec<_>>();
        let (cl, cd, cm) = (
            column(table.lift()),
            column(table.drag()),
            column(table.moment()),
        );
        Self {
            name,
            reynolds,
            correct_re: false,
            tables: vec![ReynoldsTable::new(reynolds, table)],
            derived_list: vec![derived],
            re_list: vec![reynolds],
            angles,
            cl,
            cd,
            cm,
            cache: ReCache {
                reynolds,
                index: 0,
                frac: 0.0,
                derived,
            },
            reference: None,
        }
    }

    /// Profile backed by a Reynolds family.
    ///
    /// With `correct_re == false` the family is evaluated once at `reynolds`
    /// and later [`update_re`](Self::update_re) calls only record the value.
    ///
    /// # Errors
    /// Empty family or Reynolds numbers that are not strictly increasing.
    pub fn with_reynolds(
        name: impl Into<String>,
        tables: Vec<ReynoldsTable>,
        reynolds: f64,
        correct_re: bool,
    ) -> ProfileResult<Self> {
        let name = name.into();
        if tables.is_empty() {
            return Err(ProfileError::MissingTable { name });
        }
        let re_list: Vec<f64> = tables.iter().map(|t| t.reynolds).collect();
        ensure_strictly_increasing(&re_list, "Reynolds number list")?;
        if !reynolds.is_finite() || reynolds <= 0.0 {
            return Err(ProfileError::InvalidArg {
                what: "Reynolds number must be positive",
            });
        }

        let mut angles: Vec<f64> = tables
            .iter()
            .flat_map(|t| t.table.angles().iter().copied())
            .collect();
        angles.sort_by(f64::total_cmp);
        angles.dedup();

        let resampled: Vec<[Vec<f64>; 3]> = tables
            .iter()
            .map(|t| t.table.resampled_columns(&angles))
            .collect();
        let matrix = |k: usize| -> Vec<Vec<f64>> {
            (0..angles.len())
                .map(|i| resampled.iter().map(|cols| cols[k][i]).collect())
                .collect()
        };
        let (cl, cd, cm) = (matrix(0), matrix(1), matrix(2));

        let derived_list: Vec<DerivedScalars> = tables
            .iter()
            .map(|t| DerivedScalars::analyze(&t.table))
            .collect();
        let cache = Self::build_cache(&re_list, &derived_list, reynolds);

        Ok(Self {
            name,
            reynolds,
            correct_re,
            tables,
            derived_list,
            re_list,
            angles,
            cl,
            cd,
            cm,
            cache,
            reference: None,
        })
    }

    /// Build from a case-file description.
    pub fn from_config(config: &ProfileConfig) -> ProfileResult<Self> {
        if !config.reynolds_tables.is_empty() {
            let tables = config
                .reynolds_tables
                .iter()
                .map(|def| {
                    let table = PolarTable::new(def.table.clone())?;
                    Ok(ReynoldsTable::new(def.reynolds, table))
                })
                .collect::<ProfileResult<Vec<_>>>()?;
            return Self::with_reynolds(&config.name, tables, config.reynolds, config.correct_re);
        }
        match &config.table {
            Some(rows) => {
                let table = PolarTable::new(rows.clone())?;
                match config.reference_reynolds {
                    Some(reference) if config.correct_re => {
                        Self::with_reference(&config.name, table, config.reynolds, reference)
                    }
                    _ => {
                        let mut profile = Self::new(&config.name, table);
                        profile.reynolds = config.reynolds;
                        Ok(profile)
                    }
                }
            }
            None => Err(ProfileError::MissingTable {
                name: config.name.clone(),
            }),
        }
    }

    fn build_cache(re_list: &[f64], derived_list: &[DerivedScalars], reynolds: f64) -> ReCache {
        let index = binary_search(re_list, reynolds);
        let frac = fraction(reynolds, re_list, index);
        let derived = if derived_list.len() < 2 {
            derived_list[0]
        } else {
            derived_list[index].lerp(&derived_list[index + 1], frac)
        };
        ReCache {
            reynolds,
            index,
            frac,
            derived,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current Reynolds number.
    pub fn reynolds(&self) -> f64 {
        self.reynolds
    }

    /// Whether lookups follow the live Reynolds number.
    pub fn correct_re(&self) -> bool {
        self.correct_re
    }

    /// Source tables, ordered by Reynolds number.
    pub fn tables(&self) -> &[ReynoldsTable] {
        &self.tables
    }

    /// Derived scalars of each source table.
    pub fn derived_list(&self) -> &[DerivedScalars] {
        &self.derived_list
    }

    pub fn reynolds_list(&self) -> &[f64] {
        &self.re_list
    }

    /// Whether Reynolds updates rewrite the table itself rather than move
    /// along a family. Consumers then refit anything derived from the table.
    pub fn rescales_table(&self) -> bool {
        self.reference.is_some()
    }

    /// Bracket index and fraction of the Reynolds number lookups currently use.
    pub fn re_bracket(&self) -> (usize, f64) {
        (self.cache.index, self.cache.frac)
    }

    /// Record a new Reynolds number.
    ///
    /// Returns `true` when the interpolation cache was rebuilt.
    pub fn update_re(&mut self, reynolds: f64) -> bool {
        self.reynolds = reynolds;
        if !self.correct_re || !reynolds.is_finite() {
            return false;
        }
        let tol = Tolerances {
            abs: 0.0,
            rel: RE_TOLERANCE,
        };
        if nearly_equal(reynolds, self.cache.reynolds, tol) {
            return false;
        }
        self.rebuild_re(reynolds)
    }

    /// Record a Reynolds number and rebuild the cache for exactly that value,
    /// ignoring the tolerance. Returns `false` when corrections are inactive.
    ///
    /// Replicas restoring a published state use this so their lookups match
    /// the owner bit for bit.
    pub fn rebuild_re(&mut self, reynolds: f64) -> bool {
        self.reynolds = reynolds;
        if !self.correct_re || !reynolds.is_finite() {
            return false;
        }
        if let Some(reference) = self.reference.take() {
            let rebuilt = match reference.rescaled(reynolds) {
                Ok(table) => {
                    let name = std::mem::take(&mut self.name);
                    *self = Self::single(name, table, reynolds);
                    self.correct_re = true;
                    debug!(
                        profile = %self.name,
                        reynolds,
                        reference = reference.reynolds,
                        "Rescaled table to Reynolds number"
                    );
                    true
                }
                Err(e) => {
                    warn!(profile = %self.name, reynolds, "Keeping table: {e}");
                    false
                }
            };
            self.reference = Some(reference);
            return rebuilt;
        }
        self.cache = Self::build_cache(&self.re_list, &self.derived_list, reynolds);
        debug!(
            profile = %self.name,
            reynolds,
            index = self.cache.index,
            frac = self.cache.frac,
            "Rebuilt Reynolds interpolation cache"
        );
        true
    }

    /// Derived scalars for the active (possibly Reynolds-interpolated) data.
    pub fn derived(&self) -> DerivedScalars {
        self.cache.derived
    }

    pub fn static_stall_angle_rad(&self) -> f64 {
        self.cache.derived.static_stall_angle_rad()
    }

    pub fn zero_lift_drag(&self) -> f64 {
        self.cache.derived.zero_lift_drag
    }

    pub fn zero_lift_angle_deg(&self) -> f64 {
        self.cache.derived.zero_lift_angle_deg
    }

    pub fn zero_lift_moment(&self) -> f64 {
        self.cache.derived.zero_lift_moment
    }

    pub fn normal_coeff_slope(&self) -> f64 {
        self.cache.derived.normal_coeff_slope
    }

    fn lookup(&self, alpha_deg: f64, data: &[Vec<f64>]) -> f64 {
        let i = binary_search(&self.angles, alpha_deg);
        let frac = fraction(alpha_deg, &self.angles, i);
        interpolate2d_frac(frac, self.cache.frac, data, i, self.cache.index)
    }

    pub fn lift_coefficient(&self, alpha_deg: f64) -> f64 {
        self.lookup(alpha_deg, &self.cl)
    }

    pub fn drag_coefficient(&self, alpha_deg: f64) -> f64 {
        self.lookup(alpha_deg, &self.cd)
    }

    pub fn moment_coefficient(&self, alpha_deg: f64) -> f64 {
        self.lookup(alpha_deg, &self.cm)
    }

    pub fn normal_coefficient(&self, alpha_deg: f64) -> f64 {
        let c = self.coefficients(alpha_deg);
        to_normal(c.cl, c.cd, alpha_deg)
    }

    pub fn chordwise_coefficient(&self, alpha_deg: f64) -> f64 {
        let c = self.coefficients(alpha_deg);
        to_chordwise(c.cl, c.cd, alpha_deg)
    }

    /// Lift, drag and moment at one angle.
    pub fn coefficients(&self, alpha_deg: f64) -> StaticCoefficients {
        let i = binary_search(&self.angles, alpha_deg);
        let frac = fraction(alpha_deg, &self.angles, i);
        let (ri, rf) = (self.cache.index, self.cache.frac);
        StaticCoefficients {
            cl: interpolate2d_frac(frac, rf, &self.cl, i, ri),
            cd: interpolate2d_frac(frac, rf, &self.cd, i, ri),
            cm: interpolate2d_frac(frac, rf, &self.cm, i, ri),
        }
    }

    /// Active-table rows with angle in `[start_deg, stop_deg]`.
    pub fn rows_between(&self, start_deg: f64, stop_deg: f64) -> Vec<PolarRow> {
        self.angles
            .iter()
            .filter(|a| **a >= start_deg && **a <= stop_deg)
            .map(|a| {
                let c = self.coefficients(*a);
                PolarRow::new(*a, c.cl, c.cd, c.cm)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_table(scale: f64) -> PolarTable {
        PolarTable::new(vec![
            [-10.0, -1.0 * scale, 0.02, 0.0],
            [0.0, 0.0, 0.01, 0.0],
            [10.0, 1.0 * scale, 0.02, 0.0],
            [20.0, 0.8 * scale, 0.2, 0.0],
        ])
        .unwrap()
    }

    fn family() -> Vec<ReynoldsTable> {
        vec![
            ReynoldsTable::new(1e5, scenario_table(0.8)),
            ReynoldsTable::new(1e6, scenario_table(1.0)),
        ]
    }

    #[test]
    fn single_table_quasi_steady_lift() {
        let p = ProfileData::new("flat", scenario_table(1.0));
        assert!((p.lift_coefficient(5.0) - 0.5).abs() < 1e-12);
        assert_eq!(p.lift_coefficient(40.0), 0.8);
        assert!(!p.correct_re());
    }

    #[test]
    fn family_interpolates_in_reynolds() {
        let p = ProfileData::with_reynolds("fam", family(), 5.5e5, true).unwrap();
        // halfway between the 0.8 and 1.0 scaled tables
        assert!((p.lift_coefficient(10.0) - 0.9).abs() < 1e-12);
        let (index, frac) = p.re_bracket();
        assert_eq!(index, 0);
        assert!((frac - 0.5).abs() < 1e-12);
    }

    #[test]
    fn update_re_rebuilds_only_beyond_tolerance() {
        let mut p = ProfileData::with_reynolds("fam", family(), 1e5, true).unwrap();
        assert!((p.lift_coefficient(10.0) - 0.8).abs() < 1e-12);
        assert!(!p.update_re(1e5 * (1.0 + 1e-9)));
        assert!(p.update_re(1e6));
        assert!((p.lift_coefficient(10.0) - 1.0).abs() < 1e-12);
        // clamped above the last table
        assert!(p.update_re(5e6));
        assert!((p.lift_coefficient(10.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn update_re_ignored_without_correction() {
        let mut p = ProfileData::with_reynolds("fam", family(), 1e5, false).unwrap();
        assert!(!p.update_re(1e6));
        assert_eq!(p.reynolds(), 1e6);
        assert!((p.lift_coefficient(10.0) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn rejects_unordered_reynolds() {
        let mut tables = family();
        tables.reverse();
        assert!(ProfileData::with_reynolds("fam", tables, 1e5, true).is_err());
    }

    #[test]
    fn union_grid_resampling() {
        let coarse = PolarTable::new(vec![[0.0, 0.0, 0.01, 0.0], [10.0, 1.0, 0.01, 0.0]]).unwrap();
        let fine = PolarTable::new(vec![
            [0.0, 0.0, 0.01, 0.0],
            [5.0, 0.6, 0.01, 0.0],
            [10.0, 1.0, 0.01, 0.0],
        ])
        .unwrap();
        let p = ProfileData::with_reynolds(
            "mixed",
            vec![ReynoldsTable::new(1e5, coarse), ReynoldsTable::new(2e5, fine)],
            1.5e5,
            true,
        )
        .unwrap();
        // coarse gives 0.5 at 5 deg, fine gives 0.6
        assert!((p.lift_coefficient(5.0) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn missing_table_is_config_error() {
        let config = ProfileConfig {
            name: "empty".into(),
            table: None,
            reynolds_tables: vec![],
            reynolds: 1e6,
            correct_re: false,
            reference_reynolds: None,
        };
        assert!(matches!(
            ProfileData::from_config(&config),
            Err(ProfileError::MissingTable { .. })
        ));
    }

    #[test]
    fn derived_follow_reynolds() {
        let mut p = ProfileData::with_reynolds("fam", family(), 1e5, true).unwrap();
        let low = p.normal_coeff_slope();
        p.update_re(1e6);
        let high = p.normal_coeff_slope();
        assert!(high > low);
        let expected = p.derived_list()[1].normal_coeff_slope;
        assert!((p.derived().normal_coeff_slope - expected).abs() < 1e-12);
    }

    #[test]
    fn reference_table_rescales_with_reynolds() {
        let table = scenario_table(1.0);
        let mut p = ProfileData::with_reference("ref", table.clone(), 1e6, 1e6).unwrap();
        assert!(p.rescales_table());
        assert_eq!(p.tables()[0].table, table);

        assert!(p.update_re(4e6));
        let angle_scale = 4.0_f64.powf(RE_ANGLE_EXPONENT);
        let drag_scale = 4.0_f64.powf(-RE_DRAG_EXPONENT);
        // stall and the lift peak move up, drag drops
        assert!((p.derived().static_stall_angle_deg - 10.0 * angle_scale).abs() < 1e-9);
        assert!((p.lift_coefficient(10.0 * angle_scale) - 1.0).abs() < 1e-12);
        assert!((p.drag_coefficient(0.0) - 0.01 * drag_scale).abs() < 1e-12);

        // always rebuilt from the unmodified table
        assert!(p.update_re(1e6));
        assert_eq!(p.tables()[0].table, table);
        assert!(!p.update_re(1e6 * (1.0 + 1e-9)));
    }

    #[test]
    fn reference_reynolds_from_config() {
        let mut config = ProfileConfig {
            name: "ref".into(),
            table: Some(vec![
                [-10.0, -1.0, 0.02, 0.0],
                [0.0, 0.0, 0.01, 0.0],
                [10.0, 1.0, 0.02, 0.0],
            ]),
            reynolds_tables: vec![],
            reynolds: 2e6,
            correct_re: true,
            reference_reynolds: Some(1e6),
        };
        let p = ProfileData::from_config(&config).unwrap();
        assert!(p.rescales_table());
        assert!(p.drag_coefficient(0.0) < 0.01);

        // without correct_re the table is used as given
        config.correct_re = false;
        let p = ProfileData::from_config(&config).unwrap();
        assert!(!p.rescales_table());
        assert_eq!(p.drag_coefficient(0.0), 0.01);

        config.reference_reynolds = Some(-1.0);
        config.correct_re = true;
        assert!(ProfileData::from_config(&config).is_err());
    }
}
