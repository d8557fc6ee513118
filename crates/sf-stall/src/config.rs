//! Model constants.
//!
//! Time constants are in semichords travelled (nondimensional time `S`),
//! angles in degrees unless the field name says otherwise.

use crate::error::{StallError, StallResult};
use crate::kind::ModelKind;
use serde::{Deserialize, Serialize};

fn default_speed_of_sound() -> f64 {
    340.0
}
fn default_a1() -> f64 {
    0.3
}
fn default_a2() -> f64 {
    0.7
}
fn default_b1() -> f64 {
    0.14
}
fn default_b2() -> f64 {
    0.53
}
fn default_tp() -> f64 {
    1.7
}
fn default_tf() -> f64 {
    3.0
}
fn default_tv() -> f64 {
    6.0
}
fn default_tvl() -> f64 {
    7.0
}
fn default_eta() -> f64 {
    0.95
}
fn default_cm_exponent() -> f64 {
    2.0
}
fn default_f_crit() -> f64 {
    0.6
}
fn default_stall_hysteresis() -> f64 {
    0.02
}
fn default_ct_angle_limit() -> f64 {
    30.0
}

/// Coefficients of the exponential separation-point fit
/// `f = 1 - B exp((|α| - α1)/S1)` below `α1`, `C + D exp((α1 - |α|)/S2)` above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KirchhoffFit {
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl KirchhoffFit {
    pub const CLASSIC: KirchhoffFit = KirchhoffFit {
        b: 0.3,
        c: 0.04,
        d: 0.66,
    };

    pub const THIRD_GEN: KirchhoffFit = KirchhoffFit {
        b: 0.4,
        c: 0.02,
        d: 0.58,
    };

    pub fn for_kind(kind: ModelKind) -> Self {
        match kind {
            ModelKind::LeishmanBeddoes3G => Self::THIRD_GEN,
            _ => Self::CLASSIC,
        }
    }

    fn validate(&self) -> StallResult<()> {
        if !(self.b > 0.0 && self.b <= 1.0) {
            return Err(StallError::InvalidConfig {
                what: "Kirchhoff B must be in (0, 1]",
            });
        }
        if !(self.c >= 0.0 && self.d > 0.0 && self.c + self.d <= 1.0) {
            return Err(StallError::InvalidConfig {
                what: "Kirchhoff C and D must be non-negative with C + D <= 1",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThirdGenConfig {
    #[serde(default = "ThirdGenConfig::default_a3")]
    pub a3: f64,
    #[serde(default = "ThirdGenConfig::default_t1")]
    pub t1: f64,
    #[serde(default = "ThirdGenConfig::default_t2")]
    pub t2: f64,
    #[serde(default = "ThirdGenConfig::default_t3")]
    pub t3: f64,
}

impl ThirdGenConfig {
    fn default_a3() -> f64 {
        0.5
    }
    fn default_t1() -> f64 {
        2.0
    }
    fn default_t2() -> f64 {
        1.0
    }
    fn default_t3() -> f64 {
        0.5
    }
}

impl Default for ThirdGenConfig {
    fn default() -> Self {
        Self {
            a3: Self::default_a3(),
            t1: Self::default_t1(),
            t2: Self::default_t2(),
            t3: Self::default_t3(),
        }
    }
}

/// Constants of the corrected (SGC and Sheng-Dyachuk) variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectedConfig {
    /// Angle deficiency time constant
    #[serde(default = "CorrectedConfig::default_t_alpha")]
    pub t_alpha: f64,
    /// Reduced pitch rate above which onset happens at the full dynamic angle
    #[serde(default = "CorrectedConfig::default_r0")]
    pub r0: f64,
    /// Dynamic stall onset angle above the static stall angle (deg)
    #[serde(default = "CorrectedConfig::default_ds0_margin")]
    pub ds0_margin_deg: f64,
    /// Chordwise force offset
    #[serde(default)]
    pub e0: f64,
    #[serde(default)]
    pub ct_correction: bool,
    #[serde(default)]
    pub alpha_attached_correction: bool,
    #[serde(default)]
    pub cross_flow_turbine: bool,
}

impl CorrectedConfig {
    fn default_t_alpha() -> f64 {
        6.3
    }
    fn default_r0() -> f64 {
        0.01
    }
    fn default_ds0_margin() -> f64 {
        3.0
    }
}

impl Default for CorrectedConfig {
    fn default() -> Self {
        Self {
            t_alpha: Self::default_t_alpha(),
            r0: Self::default_r0(),
            ds0_margin_deg: Self::default_ds0_margin(),
            e0: 0.0,
            ct_correction: false,
            alpha_attached_correction: false,
            cross_flow_turbine: false,
        }
    }
}

/// All constants of a dynamic stall model. Validated once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StallConfig {
    /// Chord length (m)
    pub chord: f64,
    /// Speed of sound (m/s)
    #[serde(default = "default_speed_of_sound")]
    pub speed_of_sound: f64,
    #[serde(default = "default_a1")]
    pub a1: f64,
    #[serde(default = "default_a2")]
    pub a2: f64,
    #[serde(default = "default_b1")]
    pub b1: f64,
    #[serde(default = "default_b2")]
    pub b2: f64,
    /// Normal force lag time constant
    #[serde(default = "default_tp")]
    pub tp: f64,
    /// Separation point lag time constant
    #[serde(default = "default_tf")]
    pub tf: f64,
    /// Vortex decay time constant
    #[serde(default = "default_tv")]
    pub tv: f64,
    /// Vortex travel time over the chord
    #[serde(default = "default_tvl")]
    pub tvl: f64,
    /// Chordwise force recovery factor
    #[serde(default = "default_eta")]
    pub eta: f64,
    #[serde(default)]
    pub k0: f64,
    #[serde(default = "default_cm_exponent")]
    pub cm_exponent: f64,
    /// Separation fraction at which stall engages
    #[serde(default = "default_f_crit")]
    pub f_crit: f64,
    /// Half-width of the band around `f_crit` the flag needs to cross
    #[serde(default = "default_stall_hysteresis")]
    pub stall_hysteresis: f64,
    #[serde(default = "default_ct_angle_limit")]
    pub ct_angle_limit_deg: f64,
    /// Overrides the per-variant separation fit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kirchhoff: Option<KirchhoffFit>,
    #[serde(default)]
    pub third_gen: ThirdGenConfig,
    #[serde(default)]
    pub corrected: CorrectedConfig,
}

impl StallConfig {
    /// Defaults for every constant except the chord.
    pub fn new(chord: f64) -> Self {
        Self {
            chord,
            speed_of_sound: default_speed_of_sound(),
            a1: default_a1(),
            a2: default_a2(),
            b1: default_b1(),
            b2: default_b2(),
            tp: default_tp(),
            tf: default_tf(),
            tv: default_tv(),
            tvl: default_tvl(),
            eta: default_eta(),
            k0: 0.0,
            cm_exponent: default_cm_exponent(),
            f_crit: default_f_crit(),
            stall_hysteresis: default_stall_hysteresis(),
            ct_angle_limit_deg: default_ct_angle_limit(),
            kirchhoff: None,
            third_gen: ThirdGenConfig::default(),
            corrected: CorrectedConfig::default(),
        }
    }

    /// Separation fit used by `kind`.
    pub fn kirchhoff_for(&self, kind: ModelKind) -> KirchhoffFit {
        self.kirchhoff.unwrap_or_else(|| KirchhoffFit::for_kind(kind))
    }

    /// Check every constant.
    ///
    /// # Errors
    /// `InvalidConfig` naming the first offending constant.
    pub fn validate(&self) -> StallResult<()> {
        positive(self.chord, "chord must be positive")?;
        positive(self.speed_of_sound, "speed of sound must be positive")?;
        non_negative(self.a1, "A1 must be non-negative")?;
        non_negative(self.a2, "A2 must be non-negative")?;
        positive(self.b1, "b1 must be positive")?;
        positive(self.b2, "b2 must be positive")?;
        positive(self.tp, "Tp must be positive")?;
        positive(self.tf, "Tf must be positive")?;
        positive(self.tv, "Tv must be positive")?;
        positive(self.tvl, "Tvl must be positive")?;
        non_negative(self.eta, "eta must be non-negative")?;
        finite(self.k0, "K0 must be finite")?;
        positive(self.cm_exponent, "cm fit exponent must be positive")?;
        if !(self.f_crit > 0.0 && self.f_crit < 1.0) {
            return Err(StallError::InvalidConfig {
                what: "f_crit must be in (0, 1)",
            });
        }
        non_negative(self.stall_hysteresis, "stall hysteresis must be non-negative")?;
        if self.f_crit - self.stall_hysteresis <= 0.0 || self.f_crit + self.stall_hysteresis >= 1.0
        {
            return Err(StallError::InvalidConfig {
                what: "stall hysteresis band must stay inside (0, 1)",
            });
        }
        if !(self.ct_angle_limit_deg > 0.0 && self.ct_angle_limit_deg < 90.0) {
            return Err(StallError::InvalidConfig {
                what: "CT angle limit must be in (0, 90) deg",
            });
        }
        if let Some(fit) = &self.kirchhoff {
            fit.validate()?;
        }

        let g = &self.third_gen;
        non_negative(g.a3, "A3 must be non-negative")?;
        positive(g.t1, "T1 must be positive")?;
        positive(g.t2, "T2 must be positive")?;
        positive(g.t3, "T3 must be positive")?;

        let c = &self.corrected;
        positive(c.t_alpha, "T_alpha must be positive")?;
        positive(c.r0, "r0 must be positive")?;
        non_negative(c.ds0_margin_deg, "ds0 margin must be non-negative")?;
        finite(c.e0, "E0 must be finite")?;
        Ok(())
    }
}

fn finite(v: f64, what: &'static str) -> StallResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(StallError::InvalidConfig { what })
    }
}

fn positive(v: f64, what: &'static str) -> StallResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(StallError::InvalidConfig { what })
    }
}

fn non_negative(v: f64, what: &'static str) -> StallResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(StallError::InvalidConfig { what })
    }
}
