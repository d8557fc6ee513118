//! Case files and the prescribed-motion driver.

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use sf_core::constants::NU_AIR;
use sf_core::{m, m2ps, mps, reynolds_number};
use sf_profile::{ProfileConfig, ProfileData};
use sf_stall::{AeroCoefficients, DynamicStallModel, HostClock, ModelRegistry, StallConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

fn default_model() -> String {
    "LeishmanBeddoes".to_string()
}

fn default_subcycles() -> usize {
    1
}

/// Prescribed angle of attack history (deg).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Motion {
    Constant {
        alpha_deg: f64,
    },
    Ramp {
        start_deg: f64,
        rate_deg_per_s: f64,
    },
    Sinusoid {
        mean_deg: f64,
        amplitude_deg: f64,
        frequency_hz: f64,
    },
}

impl Motion {
    pub fn alpha_deg(&self, t: f64) -> f64 {
        match *self {
            Motion::Constant { alpha_deg } => alpha_deg,
            Motion::Ramp {
                start_deg,
                rate_deg_per_s,
            } => start_deg + rate_deg_per_s * t,
            Motion::Sinusoid {
                mean_deg,
                amplitude_deg,
                frequency_hz,
            } => mean_deg + amplitude_deg * (2.0 * std::f64::consts::PI * frequency_hz * t).sin(),
        }
    }
}

/// One run: a section, a model and a motion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub profile: ProfileConfig,
    #[serde(default = "default_model")]
    pub model: String,
    pub config: StallConfig,
    pub motion: Motion,
    /// Relative speed (m/s)
    pub velocity: f64,
    pub dt: f64,
    pub t_end: f64,
    /// Evaluations per time level
    #[serde(default = "default_subcycles")]
    pub subcycles: usize,
}

impl Case {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::CaseRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> CliResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Check the model name, the constants, the profile and the run settings.
    pub fn validate(&self, registry: &ModelRegistry) -> CliResult<()> {
        registry.validate(&self.model)?;
        self.config.validate()?;
        ProfileData::from_config(&self.profile)?;
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(CliError::InvalidCase("dt must be positive".into()));
        }
        if !(self.t_end >= 0.0 && self.t_end.is_finite()) {
            return Err(CliError::InvalidCase("t_end must be non-negative".into()));
        }
        if !self.velocity.is_finite() {
            return Err(CliError::InvalidCase("velocity must be finite".into()));
        }
        if self.subcycles == 0 {
            return Err(CliError::InvalidCase("subcycles must be at least 1".into()));
        }
        Ok(())
    }

    /// Chord Reynolds number in air.
    pub fn reynolds(&self) -> f64 {
        reynolds_number(
            mps(self.velocity.abs()),
            m(self.config.chord),
            m2ps(NU_AIR),
        )
    }
}

/// One output row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub time: f64,
    pub alpha_deg: f64,
    pub coefficients: AeroCoefficients,
    pub stalled: bool,
}

/// Drive `model_name` through the case motion.
pub fn run_case(case: &Case, model_name: &str, registry: &ModelRegistry) -> CliResult<Vec<Sample>> {
    let clock = Arc::new(HostClock::new(0.0));
    let profile = ProfileData::from_config(&case.profile)?;
    let correct_re = profile.correct_re();
    let mut model = registry.create(model_name, case.config.clone(), profile, clock.clone())?;
    if correct_re {
        model.update_re(case.reynolds());
    }

    let steps = (case.t_end / case.dt).round() as usize;
    let mut samples = Vec::with_capacity(steps + 1);
    for n in 0..=steps {
        let time = n as f64 * case.dt;
        clock.set(time);
        let alpha_deg = case.motion.alpha_deg(time);
        let mut out = AeroCoefficients::default();
        for _ in 0..case.subcycles.max(1) {
            out = model.step(case.velocity, alpha_deg)?;
        }
        samples.push(Sample {
            time,
            alpha_deg,
            coefficients: out,
            stalled: model.stalled(),
        });
    }
    info!(model = model_name, samples = samples.len(), "Run finished");
    Ok(samples)
}

/// Samples as CSV with header `time,alpha_deg,cl,cd,cm,stalled`.
pub fn to_csv(samples: &[Sample]) -> String {
    let mut csv = String::from("time,alpha_deg,cl,cd,cm,stalled\n");
    for s in samples {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            s.time,
            s.alpha_deg,
            s.coefficients.cl,
            s.coefficients.cd,
            s.coefficients.cm,
            u8::from(s.stalled)
        ));
    }
    csv
}

/// Per-model summary printed by `compare`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub model: String,
    pub max_cl: f64,
    pub min_cl: f64,
    pub mean_cd: f64,
    pub stalled_fraction: f64,
}

impl Summary {
    pub fn from_samples(model: &str, samples: &[Sample]) -> Self {
        let n = samples.len().max(1) as f64;
        Self {
            model: model.to_string(),
            max_cl: samples
                .iter()
                .map(|s| s.coefficients.cl)
                .fold(f64::NEG_INFINITY, f64::max),
            min_cl: samples
                .iter()
                .map(|s| s.coefficients.cl)
                .fold(f64::INFINITY, f64::min),
            mean_cd: samples.iter().map(|s| s.coefficients.cd).sum::<f64>() / n,
            stalled_fraction: samples.iter().filter(|s| s.stalled).count() as f64 / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASE: &str = r#"
profile:
  name: scenario
  table:
    - [-10.0, -1.0, 0.02, 0.0]
    - [0.0, 0.0, 0.01, 0.0]
    - [10.0, 1.0, 0.02, 0.0]
    - [20.0, 0.8, 0.2, -0.05]
model: LeishmanBeddoes
config:
  chord: 1.0
motion:
  type: Ramp
  start_deg: 5.0
  rate_deg_per_s: 0.1
velocity: 10.0
dt: 0.01
t_end: 10.0
"#;

    #[test]
    fn parse_and_validate() {
        let case = Case::from_yaml(CASE).unwrap();
        assert_eq!(case.subcycles, 1);
        assert!(case.validate(&ModelRegistry::with_defaults()).is_ok());
        assert!((case.motion.alpha_deg(10.0) - 6.0).abs() < 1e-12);
        assert!((case.reynolds() - 10.0 / NU_AIR).abs() < 1e-3);
    }

    #[test]
    fn unknown_model_rejected() {
        let mut case = Case::from_yaml(CASE).unwrap();
        case.model = "Nope".into();
        assert!(matches!(
            case.validate(&ModelRegistry::with_defaults()),
            Err(CliError::Stall(_))
        ));
    }

    #[test]
    fn ramp_run_produces_rows() {
        let case = Case::from_yaml(CASE).unwrap();
        let registry = ModelRegistry::with_defaults();
        let samples = run_case(&case, &case.model, &registry).unwrap();
        assert_eq!(samples.len(), 1001);
        assert!(samples.iter().all(|s| !s.stalled));
        // lift follows the ramp upward
        assert!(samples[1000].coefficients.cl > samples[0].coefficients.cl);

        let csv = to_csv(&samples[..2]);
        assert!(csv.starts_with("time,alpha_deg,cl,cd,cm,stalled\n"));
        assert_eq!(csv.lines().count(), 3);

        let summary = Summary::from_samples("LeishmanBeddoes", &samples);
        assert!(summary.max_cl >= summary.min_cl);
        assert_eq!(summary.stalled_fraction, 0.0);
    }

    #[test]
    fn reference_table_follows_case_reynolds() {
        let plain = Case::from_yaml(CASE).unwrap();
        let mut corrected = plain.clone();
        corrected.profile.correct_re = true;
        corrected.profile.reference_reynolds = Some(1e5);
        let registry = ModelRegistry::with_defaults();

        let mean_cd = |case: &Case| {
            let samples = run_case(case, &case.model, &registry).unwrap();
            Summary::from_samples(&case.model, &samples).mean_cd
        };
        // the case runs well above 1e5, so the rescaled drag is lower
        assert!(mean_cd(&corrected) < mean_cd(&plain));
    }

    #[test]
    fn sinusoid_motion() {
        let motion = Motion::Sinusoid {
            mean_deg: 10.0,
            amplitude_deg: 5.0,
            frequency_hz: 0.25,
        };
        assert!((motion.alpha_deg(1.0) - 15.0).abs() < 1e-12);
    }
}
