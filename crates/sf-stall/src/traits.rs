//! The contract hosts program against.

use crate::error::StallResult;
use crate::kind::ModelKind;
use crate::state::AeroCoefficients;
use crate::sync::{ReplicaExchange, ReplicaSnapshot};

/// A dynamic stall model attached to one airfoil section.
///
/// Models read the host time themselves, so a host calls [`step`](Self::step)
/// any number of times per time level: the first call at a new time advances
/// the state, later calls at the same time re-evaluate from the same
/// committed state.
pub trait DynamicStallModel: Send + Sync {
    /// Registered model name.
    fn name(&self) -> &str;

    fn kind(&self) -> ModelKind;

    /// Corrected coefficients for relative speed `mag_u` (m/s) and angle of
    /// attack `alpha_deg`.
    ///
    /// # Errors
    /// `TimeReversal` when the host time moved backwards, `NonFinite` when
    /// the inputs or the result are not finite.
    fn step(&mut self, mag_u: f64, alpha_deg: f64) -> StallResult<AeroCoefficients>;

    /// Publish (owner) or adopt (everyone else) the section state.
    fn synchronize(&mut self, owned: bool, exchange: &dyn ReplicaExchange) -> StallResult<()>;

    /// Pass the live Reynolds number to the static data.
    fn update_re(&mut self, reynolds: f64);

    fn stalled(&self) -> bool;

    fn last_output(&self) -> Option<AeroCoefficients>;

    fn snapshot(&self) -> ReplicaSnapshot;
}
