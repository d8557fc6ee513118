//! The dynamic stall model shared by every variant.

use crate::clock::TimeSource;
use crate::config::{KirchhoffFit, StallConfig};
use crate::error::{StallError, StallResult};
use crate::kind::ModelKind;
use crate::physics::Evaluator;
use crate::state::{AeroCoefficients, StallState, StateHistory};
use crate::static_data::{StaticCache, StaticConstants};
use crate::sync::{ReplicaExchange, ReplicaSnapshot};
use crate::traits::DynamicStallModel;
use sf_core::ensure_finite;
use sf_profile::ProfileData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Speeds below this leave the state untouched (m/s)
pub const MIN_SPEED: f64 = 1e-6;

/// Dynamic stall model for one section.
///
/// Holds the committed (`previous`) and latest (`current`) snapshots. A call
/// at a time later than `current` commits it and advances; a call at the same
/// time re-evaluates from the committed snapshot and only replaces `current`.
pub struct DynamicStall {
    kind: ModelKind,
    config: StallConfig,
    fit: KirchhoffFit,
    profile: ProfileData,
    statics: StaticCache,
    clock: Arc<dyn TimeSource>,
    history: Option<StateHistory>,
    output: Option<AeroCoefficients>,
    evaluations: u64,
}

impl DynamicStall {
    /// Build a model, validating the constants and fitting the static data.
    pub fn new(
        kind: ModelKind,
        config: StallConfig,
        profile: ProfileData,
        clock: Arc<dyn TimeSource>,
    ) -> StallResult<Self> {
        config.validate()?;
        let fit = config.kirchhoff_for(kind);
        let statics = StaticCache::build(&profile, fit, &config);
        debug!(
            model = kind.name(),
            profile = profile.name(),
            alpha_ss = statics.active().alpha_ss,
            cn_alpha = statics.active().cn_alpha,
            "Dynamic stall model constructed"
        );
        Ok(Self {
            kind,
            config,
            fit,
            profile,
            statics,
            clock,
            history: None,
            output: None,
            evaluations: 0,
        })
    }

    pub fn config(&self) -> &StallConfig {
        &self.config
    }

    pub fn profile(&self) -> &ProfileData {
        &self.profile
    }

    /// Static constants at the live Reynolds number.
    pub fn constants(&self) -> &StaticConstants {
        self.statics.active()
    }

    pub fn history(&self) -> Option<&StateHistory> {
        self.history.as_ref()
    }

    pub fn current(&self) -> Option<&StallState> {
        self.history.as_ref().map(|h| &h.current)
    }

    pub fn previous(&self) -> Option<&StallState> {
        self.history.as_ref().map(|h| &h.previous)
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    fn evaluator(&self) -> Evaluator<'_> {
        Evaluator {
            kind: self.kind,
            config: &self.config,
            fit: self.fit,
            constants: self.statics.active(),
            profile: &self.profile,
        }
    }

    /// Follow a Reynolds change of the profile.
    fn refit_statics(&mut self) {
        if self.profile.rescales_table() {
            self.statics = StaticCache::build(&self.profile, self.fit, &self.config);
        } else {
            self.statics.refresh(self.profile.re_bracket());
        }
    }

    /// Overwrite the whole state with a published snapshot.
    pub fn restore(&mut self, snapshot: ReplicaSnapshot) -> StallResult<()> {
        if snapshot.kind != self.kind {
            return Err(StallError::Replica {
                what: "snapshot comes from a different model variant",
            });
        }
        if self.profile.rebuild_re(snapshot.reynolds) {
            self.refit_statics();
        }
        self.history = snapshot.history;
        self.output = snapshot.output;
        self.evaluations = snapshot.evaluations;
        Ok(())
    }
}

impl DynamicStallModel for DynamicStall {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn step(&mut self, mag_u: f64, alpha_deg: f64) -> StallResult<AeroCoefficients> {
        let time = ensure_finite(self.clock.time(), "host time")?;
        let speed = ensure_finite(mag_u, "relative velocity")?.abs();
        let alpha_deg = ensure_finite(alpha_deg, "angle of attack")?;

        if speed < MIN_SPEED {
            warn!(
                model = self.kind.name(),
                time, "Relative velocity vanished; holding the last output"
            );
            return Ok(self.output.unwrap_or_else(|| {
                let s = self.profile.coefficients(alpha_deg);
                AeroCoefficients {
                    cl: s.cl,
                    cd: s.cd,
                    cm: s.cm,
                }
            }));
        }

        let previous = match &self.history {
            None => self.evaluator().steady_state(time, speed, alpha_deg),
            Some(h) if time > h.current.time => h.current,
            Some(h) if time < h.current.time => {
                return Err(StallError::TimeReversal {
                    time,
                    latest: h.current.time,
                });
            }
            Some(h) => h.previous,
        };

        let (current, out) = self.evaluator().evaluate(&previous, time, speed, alpha_deg);
        ensure_finite(out.cl, "lift coefficient")?;
        ensure_finite(out.cd, "drag coefficient")?;
        ensure_finite(out.cm, "moment coefficient")?;

        if current.stalled != previous.stalled {
            debug!(
                model = self.kind.name(),
                time,
                alpha_deg,
                f_prime = current.f_prime,
                stalled = current.stalled,
                "Stall state changed"
            );
        }

        self.history = Some(StateHistory { previous, current });
        self.output = Some(out);
        self.evaluations += 1;
        Ok(out)
    }

    fn synchronize(&mut self, owned: bool, exchange: &dyn ReplicaExchange) -> StallResult<()> {
        if owned {
            exchange.publish(self.snapshot())
        } else {
            self.restore(exchange.fetch()?)
        }
    }

    fn update_re(&mut self, reynolds: f64) {
        if self.profile.update_re(reynolds) {
            self.refit_statics();
        }
    }

    fn stalled(&self) -> bool {
        self.history.as_ref().is_some_and(|h| h.current.stalled)
    }

    fn last_output(&self) -> Option<AeroCoefficients> {
        self.output
    }

    fn snapshot(&self) -> ReplicaSnapshot {
        ReplicaSnapshot {
            kind: self.kind,
            history: self.history,
            output: self.output,
            evaluations: self.evaluations,
            reynolds: self.profile.reynolds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::HostClock;
    use sf_profile::PolarTable;

    fn scenario_profile() -> ProfileData {
        let table = PolarTable::new(vec![
            [-10.0, -1.0, 0.02, 0.0],
            [0.0, 0.0, 0.01, 0.0],
            [10.0, 1.0, 0.02, 0.0],
            [20.0, 0.8, 0.2, -0.05],
        ])
        .unwrap();
        ProfileData::new("scenario", table)
    }

    fn model(kind: ModelKind) -> (Arc<HostClock>, DynamicStall) {
        let clock = Arc::new(HostClock::new(0.0));
        let m = DynamicStall::new(kind, StallConfig::new(1.0), scenario_profile(), clock.clone())
            .unwrap();
        (clock, m)
    }

    #[test]
    fn first_call_seeds_both_snapshots() {
        let (_clock, mut m) = model(ModelKind::LeishmanBeddoes);
        m.step(10.0, 4.0).unwrap();
        let h = m.history().unwrap();
        assert_eq!(h.previous.time, 0.0);
        assert_eq!(h.current.time, 0.0);
        assert_eq!(h.current.alpha, h.previous.alpha);
        assert_eq!(m.evaluations(), 1);
    }

    #[test]
    fn time_reversal_is_an_error() {
        let (clock, mut m) = model(ModelKind::LeishmanBeddoes);
        clock.set(1.0);
        m.step(10.0, 4.0).unwrap();
        clock.set(0.5);
        assert_eq!(
            m.step(10.0, 4.0),
            Err(StallError::TimeReversal {
                time: 0.5,
                latest: 1.0
            })
        );
    }

    #[test]
    fn zero_velocity_holds_output() {
        let (clock, mut m) = model(ModelKind::LeishmanBeddoes);
        // before any evaluation: static coefficients
        let out = m.step(0.0, 5.0).unwrap();
        assert!((out.cl - 0.5).abs() < 1e-12);
        assert!(m.history().is_none());

        clock.set(0.1);
        let live = m.step(10.0, 5.0).unwrap();
        let before = *m.history().unwrap();
        clock.set(0.2);
        let held = m.step(1e-9, 15.0).unwrap();
        assert_eq!(held, live);
        assert_eq!(*m.history().unwrap(), before);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let (_clock, mut m) = model(ModelKind::LeishmanBeddoes);
        assert!(matches!(
            m.step(10.0, f64::NAN),
            Err(StallError::NonFinite {
                what: "angle of attack",
                ..
            })
        ));
    }

    #[test]
    fn invalid_config_fails_construction() {
        let mut config = StallConfig::new(1.0);
        config.f_crit = 0.0;
        let result = DynamicStall::new(
            ModelKind::LeishmanBeddoes,
            config,
            scenario_profile(),
            Arc::new(HostClock::default()),
        );
        assert!(matches!(result, Err(StallError::InvalidConfig { .. })));
    }

    #[test]
    fn restore_rejects_other_variant() {
        let (_c1, mut a) = model(ModelKind::LeishmanBeddoes);
        let (_c2, b) = model(ModelKind::LeishmanBeddoes3G);
        assert!(a.restore(b.snapshot()).is_err());
    }
}
