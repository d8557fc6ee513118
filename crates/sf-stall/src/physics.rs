//! One evaluation of the dynamic stall equations.
//!
//! [`Evaluator::evaluate`] maps the committed snapshot plus the inputs of
//! the current call to a new snapshot and the output coefficients. It never
//! reads anything else, so repeated calls with the same inputs (sub-cycles)
//! give the same answer.

use crate::config::{KirchhoffFit, StallConfig};
use crate::kind::ModelKind;
use crate::state::{AeroCoefficients, Extension, StallState, ThirdGenLags};
use crate::static_data::{StaticConstants, kirchhoff_factor, moment_fit};
use sf_core::{SMALL, deg_to_rad, guarded_div, mach_number, mps};
use sf_profile::ProfileData;
use std::f64::consts::PI;

/// Steps shorter than this carry no impulsive loading (s)
pub const MIN_TIME_STEP: f64 = 1e-12;

/// Impulsive time constant factor of the classic model
const K_ALPHA: f64 = 0.75;

/// Chordwise travel of the centre of pressure during vortex convection
const VORTEX_CP_TRAVEL: f64 = 0.2;

/// Exponential recurrence for one deficiency function.
///
/// Decays the previous value over `ds` and adds the forcing increment with a
/// mid-step weight. The variable-step form weights with the mean of the
/// current and previous step.
#[derive(Debug, Clone, Copy)]
pub struct Lag {
    pub ds: f64,
    pub ds_prev: f64,
    pub variable_step: bool,
}

impl Lag {
    /// `exp(-ds / T)`; a vanishing time constant forgets everything.
    pub fn decay(&self, time_constant: f64) -> f64 {
        exp_over(self.ds, time_constant)
    }

    pub fn weight(&self, time_constant: f64) -> f64 {
        let span = if self.variable_step {
            0.5 * (self.ds + self.ds_prev)
        } else {
            self.ds
        };
        exp_over(0.5 * span, time_constant)
    }

    pub fn apply(&self, previous: f64, forcing: f64, time_constant: f64) -> f64 {
        previous * self.decay(time_constant) + forcing * self.weight(time_constant)
    }
}

fn exp_over(span: f64, time_constant: f64) -> f64 {
    if time_constant <= SMALL {
        if span > 0.0 { 0.0 } else { 1.0 }
    } else {
        (-span / time_constant).exp()
    }
}

/// Stall flag with hysteresis: engages below `f_crit - h` while the
/// leading-edge criterion holds, releases above `f_crit + h`, holds otherwise.
pub fn classify_stall(
    was_stalled: bool,
    f_prime: f64,
    leading_edge: bool,
    f_crit: f64,
    hysteresis: f64,
) -> bool {
    if was_stalled {
        f_prime <= f_crit + hysteresis
    } else {
        f_prime < f_crit - hysteresis && leading_edge
    }
}

/// Vortex modulation of the separation point used by the third generation
/// variant: rises while the vortex convects, falls off over `Tv / 2`.
pub fn vortex_shape(tau: f64, tvl: f64, tv: f64) -> f64 {
    if tau <= 0.0 {
        0.0
    } else if tau <= tvl {
        (PI * tau / (2.0 * tvl)).sin().powf(1.5)
    } else if tau <= tvl + 0.5 * tv {
        (PI * (tau - tvl) / tv).cos().powi(2)
    } else {
        0.0
    }
}

/// Centre of pressure shift of the vortex lift.
pub fn vortex_cp(tau: f64, tvl: f64) -> f64 {
    if tau <= tvl {
        VORTEX_CP_TRAVEL * (1.0 - (PI * tau / tvl).cos())
    } else {
        2.0 * VORTEX_CP_TRAVEL
    }
}

/// Everything an evaluation reads besides the snapshot.
pub struct Evaluator<'a> {
    pub kind: ModelKind,
    pub config: &'a StallConfig,
    pub fit: KirchhoffFit,
    pub constants: &'a StaticConstants,
    pub profile: &'a ProfileData,
}

impl Evaluator<'_> {
    fn cross_flow(&self) -> bool {
        self.kind == ModelKind::LeishmanBeddoesShengDyachuk
            && self.config.corrected.cross_flow_turbine
    }

    /// Angle the physics runs on (deg) and whether outputs are mirrored.
    fn physics_angle(&self, alpha_deg: f64) -> (f64, bool) {
        if self.cross_flow() {
            (alpha_deg.abs(), alpha_deg < 0.0)
        } else {
            (alpha_deg, false)
        }
    }

    /// Snapshot of fully developed flow held at `alpha_deg`.
    pub fn steady_state(&self, time: f64, speed: f64, alpha_deg: f64) -> StallState {
        let k = self.constants;
        let (alpha_deg, _) = self.physics_angle(alpha_deg);
        let alpha = deg_to_rad(alpha_deg);
        let f = k.separation(alpha.abs(), k.alpha1, self.fit);
        let cnc = k.cn_alpha * (alpha - k.alpha0);
        let factor = kirchhoff_factor(f);
        let leading_edge = if self.kind.is_corrected() {
            alpha.abs() > k.alpha_ss
        } else {
            cnc.abs() > k.cn1
        };
        let stalled = classify_stall(
            false,
            f,
            leading_edge,
            self.config.f_crit,
            self.config.stall_hysteresis,
        );
        let extension = match self.kind {
            ModelKind::LeishmanBeddoes => Extension::None,
            ModelKind::LeishmanBeddoes3G => Extension::ThirdGen(ThirdGenLags::default()),
            _ => Extension::Corrected { d_alpha: 0.0 },
        };
        StallState {
            time,
            alpha,
            mach: mach_number(mps(speed), mps(self.config.speed_of_sound)),
            alpha_e: alpha,
            cnp: cnc,
            cn_prime: cnc,
            f_prime: f,
            f_double_prime: f,
            cv: cnc * (1.0 - factor),
            stalled,
            cn: cnc * factor,
            extension,
            ..StallState::default()
        }
    }

    /// Advance from `prev` to `time`.
    pub fn evaluate(
        &self,
        prev: &StallState,
        time: f64,
        speed: f64,
        alpha_deg: f64,
    ) -> (StallState, AeroCoefficients) {
        let c = self.config;
        let k = self.constants;
        let (alpha_deg, mirror) = self.physics_angle(alpha_deg);
        let alpha = deg_to_rad(alpha_deg);

        let dt = time - prev.time;
        let d_alpha = alpha - prev.alpha;
        let mach = mach_number(mps(speed), mps(c.speed_of_sound));
        let ds = 2.0 * speed * dt / c.chord;
        let beta2 = (1.0 - mach * mach).max(SMALL);
        let lag = Lag {
            ds,
            ds_prev: prev.delta_s,
            variable_step: self.kind.variable_step(),
        };
        let impulsive = dt > MIN_TIME_STEP && mach >= SMALL;

        // Attached flow
        let x = lag.apply(prev.x, c.a1 * d_alpha, 1.0 / (c.b1 * beta2));
        let y = lag.apply(prev.y, c.a2 * d_alpha, 1.0 / (c.b2 * beta2));
        let mut alpha_e = alpha - x - y;

        let mut third_gen = prev.extension.third_gen();
        let mut cm_extra = 0.0;
        let (d, cni) = if self.kind == ModelKind::LeishmanBeddoes3G {
            let pitch = guarded_div(2.0 * d_alpha, ds, 0.0);
            let g = &c.third_gen;
            let prev_lags = third_gen;

            let decay3 = lag.decay(g.t3);
            third_gen.eta_l = prev_lags.eta_l * decay3 + 0.5 * pitch * (1.0 - decay3);
            third_gen.z = prev_lags.z * lag.decay(g.t1 / beta2)
                + g.a3 * (third_gen.eta_l - prev_lags.eta_l) * lag.weight(g.t2);
            alpha_e += third_gen.eta_l - third_gen.z;

            let cni = if impulsive {
                let beta = beta2.sqrt();
                let ab = c.a1 * c.b1 + c.a2 * c.b2;
                let k_alpha = 1.0 / ((1.0 - mach) + PI * beta * mach * mach * ab);
                let k_q = 1.0 / ((1.0 - mach) + 2.0 * PI * beta * mach * mach * ab);
                let t_i = 2.0 * mach;

                third_gen.lambda_l = 0.5 * PI * pitch;
                third_gen.h = lag.apply(
                    prev_lags.h,
                    third_gen.lambda_l - prev_lags.lambda_l,
                    k_alpha * t_i,
                );
                third_gen.lambda_m = -PI / 16.0 * pitch;
                third_gen.j = lag.apply(
                    prev_lags.j,
                    third_gen.lambda_m - prev_lags.lambda_m,
                    k_q * t_i,
                );
                cm_extra += third_gen.lambda_m - third_gen.j;
                third_gen.lambda_l - third_gen.h
            } else {
                0.0
            };
            cm_extra += -PI / 8.0 * (third_gen.eta_l - third_gen.z);
            (prev.d, cni)
        } else if impulsive {
            let t_k = K_ALPHA * c.chord / c.speed_of_sound;
            let forcing = (d_alpha - prev.delta_alpha) / dt;
            let d = prev.d * (-dt / t_k).exp() + forcing * (-dt / (2.0 * t_k)).exp();
            (d, 4.0 * t_k / mach * (d_alpha / dt - d))
        } else {
            (prev.d, 0.0)
        };

        let mut cnc = k.cn_alpha * (alpha_e - k.alpha0);
        let cnp = cnc + cni;

        // Leading-edge separation
        let dp = lag.apply(prev.dp, cnp - prev.cnp, c.tp);
        let cn_prime = cnp - dp;

        let corrected = self.kind.is_corrected();
        let mut d_alpha_lag = prev.extension.d_alpha();
        let (alpha_prime, alpha1, leading_edge) = if corrected {
            let cc = &c.corrected;
            d_alpha_lag = lag.apply(d_alpha_lag, d_alpha, cc.t_alpha);
            let alpha_prime = alpha - d_alpha_lag;
            let alpha_ds0 = k.alpha_ss + deg_to_rad(cc.ds0_margin_deg);
            let rate = guarded_div(d_alpha, ds, 0.0).abs();
            let alpha_cr = if rate >= cc.r0 {
                alpha_ds0
            } else {
                k.alpha_ss + (alpha_ds0 - k.alpha_ss) * rate / cc.r0
            };
            (alpha_prime, alpha_cr, alpha_prime.abs() > alpha_cr)
        } else {
            let alpha_prime = if k.cn_alpha.abs() < SMALL {
                alpha
            } else {
                cn_prime / k.cn_alpha + k.alpha0
            };
            (alpha_prime, k.alpha1, cn_prime.abs() > k.cn1)
        };

        // Trailing-edge separation
        let f_prime = k.separation(alpha_prime.abs(), alpha1, self.fit);
        let df = lag.apply(prev.df, f_prime - prev.f_prime, c.tf);
        let f_double_prime = (f_prime - df).clamp(0.0, 1.0);

        let stalled = classify_stall(
            prev.stalled,
            f_prime,
            leading_edge,
            c.f_crit,
            c.stall_hysteresis,
        );
        let tau = if stalled { prev.tau + ds } else { 0.0 };

        let f_eff = if self.kind == ModelKind::LeishmanBeddoes3G {
            let vx = vortex_shape(tau, c.tvl, c.tv);
            f_double_prime * (1.0 - vx * (1.0 - f_double_prime))
        } else {
            f_double_prime
        };

        if self.kind == ModelKind::LeishmanBeddoesShengDyachuk
            && c.corrected.alpha_attached_correction
            && f_double_prime > c.f_crit
            && !stalled
        {
            let cn_static = self.profile.normal_coefficient(alpha_deg);
            let shift = guarded_div(
                cn_static - k.steady_normal(alpha, self.fit),
                k.cn_alpha * kirchhoff_factor(f_eff),
                0.0,
            );
            alpha_e += shift;
            cnc = k.cn_alpha * (alpha_e - k.alpha0);
        }

        let factor = kirchhoff_factor(f_eff);
        let cnf = cnc * factor + cni;
        let cv = cnc * (1.0 - factor);

        // Vortex lift
        let feeding = stalled && tau > 0.0 && tau <= c.tvl && f_prime < prev.f_prime;
        let cnv = if feeding {
            lag.apply(prev.cnv, cv - prev.cv, c.tv)
        } else if tau > c.tvl {
            prev.cnv * lag.decay(0.5 * c.tv)
        } else {
            prev.cnv * lag.decay(c.tv)
        };

        let cn = cnf + cnv;

        // Chordwise force
        let limit = deg_to_rad(c.ct_angle_limit_deg);
        let incidence = (alpha_e - k.alpha0).clamp(-limit, limit);
        let mut ct = if corrected {
            c.eta * k.cn_alpha * incidence * incidence * (f_eff.sqrt() - c.corrected.e0)
        } else {
            c.eta * cnc * f_eff.sqrt() * incidence.tan()
        };
        if self.kind == ModelKind::LeishmanBeddoesShengDyachuk
            && c.corrected.ct_correction
            && !stalled
            && (alpha - k.alpha0).abs() < k.alpha_ss
        {
            let w = ((alpha - k.alpha0).abs() / k.alpha_ss).powi(2);
            let ct_static = self.profile.chordwise_coefficient(alpha_deg) + k.cd0;
            ct += w * (ct_static - ct);
        }

        // Moment
        let cm_static = self.profile.moment_coefficient(alpha_deg);
        let f_steady = k.separation(alpha.abs(), k.alpha1, self.fit);
        let cn_steady = k.steady_normal(alpha, self.fit);
        let m = c.cm_exponent;
        let cm_offset = moment_fit(cn, f_eff, c.k0, k.k1, k.k2, m)
            - moment_fit(cn_steady, f_steady, c.k0, k.k1, k.k2, m);
        let cm = cm_static + cm_offset - vortex_cp(tau, c.tvl) * cnv + cm_extra;

        let (sin_a, cos_a) = alpha.sin_cos();
        let cl = cn * cos_a + ct * sin_a;
        let cd = cn * sin_a - ct * cos_a + k.cd0;

        let extension = match self.kind {
            ModelKind::LeishmanBeddoes => Extension::None,
            ModelKind::LeishmanBeddoes3G => Extension::ThirdGen(third_gen),
            _ => Extension::Corrected {
                d_alpha: d_alpha_lag,
            },
        };

        let state = StallState {
            time,
            alpha,
            delta_alpha: d_alpha,
            delta_s: ds,
            mach,
            x,
            y,
            d,
            alpha_e,
            cnp,
            dp,
            cn_prime,
            f_prime,
            df,
            f_double_prime,
            cv,
            cnv,
            tau,
            stalled,
            cn,
            extension,
        };

        let side = if mirror { -1.0 } else { 1.0 };
        let out = AeroCoefficients {
            cl: side * cl,
            cd,
            cm: side * cm,
        };
        (state, out)
    }
}
