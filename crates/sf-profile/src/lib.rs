//! sf-profile: static airfoil data for the dynamic stall models.
//!
//! Provides:
//! - Polar tables (angle of attack vs lift, drag and moment coefficients)
//! - Reynolds-number families of polar tables with bilinear lookup
//! - Derived scalars (static stall angle, zero-lift values, normal-force slope)
//! - Conversions between lift/drag and normal/chordwise coefficients
//!
//! # Example
//!
//! ```
//! use sf_profile::{PolarRow, PolarTable, ProfileData};
//!
//! let table = PolarTable::new(vec![
//!     PolarRow::new(-10.0, -1.0, 0.02, 0.0),
//!     PolarRow::new(0.0, 0.0, 0.01, 0.0),
//!     PolarRow::new(10.0, 1.0, 0.02, 0.0),
//!     PolarRow::new(20.0, 0.8, 0.2, -0.05),
//! ])
//! .unwrap();
//!
//! let profile = ProfileData::new("flat", table);
//! assert!((profile.lift_coefficient(5.0) - 0.5).abs() < 1e-12);
//! ```

pub mod conversion;
pub mod derived;
pub mod error;
pub mod profile;
pub mod table;

// Re-exports
pub use conversion::{to_chordwise, to_drag, to_lift, to_normal};
pub use derived::DerivedScalars;
pub use error::{ProfileError, ProfileResult};
pub use profile::{ProfileConfig, ProfileData, ReynoldsTableDef};
pub use table::{PolarRow, PolarTable, ReynoldsTable, StaticCoefficients};
