//! State snapshots.
//!
//! A model keeps two snapshots: `previous`, committed at the last advancing
//! step, and `current`, the latest evaluation. Every evaluation is a pure
//! function of `previous` and the inputs, which is what makes sub-cycling
//! repeatable.

use serde::{Deserialize, Serialize};

/// Corrected lift, drag and moment coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AeroCoefficients {
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
}

/// Lags of the third generation variant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThirdGenLags {
    /// Lagged pitch forcing
    pub eta_l: f64,
    /// Circulatory pitch deficiency
    pub z: f64,
    /// Impulsive lift deficiency and its forcing
    pub h: f64,
    pub lambda_l: f64,
    /// Impulsive moment deficiency and its forcing
    pub j: f64,
    pub lambda_m: f64,
}

/// Variant-specific part of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Extension {
    #[default]
    None,
    ThirdGen(ThirdGenLags),
    /// Angle deficiency of the corrected variants
    Corrected { d_alpha: f64 },
}

impl Extension {
    pub fn third_gen(&self) -> ThirdGenLags {
        match self {
            Extension::ThirdGen(lags) => *lags,
            _ => ThirdGenLags::default(),
        }
    }

    pub fn d_alpha(&self) -> f64 {
        match self {
            Extension::Corrected { d_alpha } => *d_alpha,
            _ => 0.0,
        }
    }
}

/// Everything one evaluation produces. Angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StallState {
    pub time: f64,
    /// Angle the physics ran on (the magnitude in cross-flow mode)
    pub alpha: f64,
    pub delta_alpha: f64,
    /// Nondimensional step `2 |U| dt / c`
    pub delta_s: f64,
    pub mach: f64,
    /// Circulatory deficiencies
    pub x: f64,
    pub y: f64,
    /// Impulsive deficiency
    pub d: f64,
    pub alpha_e: f64,
    /// Potential normal force and its lag
    pub cnp: f64,
    pub dp: f64,
    pub cn_prime: f64,
    /// Separation point, lagged separation point and its deficiency
    pub f_prime: f64,
    pub df: f64,
    pub f_double_prime: f64,
    /// Vortex forcing and vortex lift
    pub cv: f64,
    pub cnv: f64,
    /// Nondimensional time since stall onset
    pub tau: f64,
    pub stalled: bool,
    /// Total normal force
    pub cn: f64,
    pub extension: Extension,
}

/// The two snapshots a model holds once it has been evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    pub previous: StallState,
    pub current: StallState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_accessors_default_to_zero() {
        assert_eq!(Extension::None.d_alpha(), 0.0);
        assert_eq!(Extension::None.third_gen(), ThirdGenLags::default());
        let ext = Extension::Corrected { d_alpha: 0.1 };
        assert_eq!(ext.d_alpha(), 0.1);
    }

    #[test]
    fn snapshot_serializes() {
        let state = StallState {
            time: 1.5,
            stalled: true,
            extension: Extension::ThirdGen(ThirdGenLags {
                z: 0.2,
                ..Default::default()
            }),
            ..Default::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: StallState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
