//! sf-core: stable foundation for stallflow.
//!
//! Contains:
//! - units (uom SI types + constructors, angle conversions)
//! - numeric (Real + tolerances + float helpers)
//! - interpolate (bracket search, 1D/2D linear interpolation)
//! - error (shared error types)

pub mod error;
pub mod interpolate;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{SfError, SfResult};
pub use numeric::*;
pub use units::*;
