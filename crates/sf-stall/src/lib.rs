//! sf-stall: Leishman-Beddoes family dynamic stall models.
//!
//! Provides:
//! - `StallConfig`: model constants with defaults and validation
//! - `DynamicStall`: one model per section, four variants selected by `ModelKind`
//! - `ModelRegistry`: name-keyed construction
//! - `TimeSource` / `HostClock`: host simulation time
//! - `ReplicaExchange`: state synchronization between replicas
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sf_profile::{PolarTable, ProfileData};
//! use sf_stall::{DynamicStallModel, HostClock, ModelRegistry, StallConfig};
//!
//! let table = PolarTable::new(vec![
//!     [-10.0, -1.0, 0.02, 0.0],
//!     [0.0, 0.0, 0.01, 0.0],
//!     [10.0, 1.0, 0.02, 0.0],
//!     [20.0, 0.8, 0.2, -0.05],
//! ])
//! .unwrap();
//! let clock = Arc::new(HostClock::new(0.0));
//! let registry = ModelRegistry::with_defaults();
//! let mut model = registry
//!     .create(
//!         "LeishmanBeddoes",
//!         StallConfig::new(1.0),
//!         ProfileData::new("flat", table),
//!         clock.clone(),
//!     )
//!     .unwrap();
//!
//! for _ in 0..100 {
//!     clock.advance(0.01);
//!     let out = model.step(10.0, 4.0).unwrap();
//!     assert!(out.cl.is_finite());
//! }
//! assert!(!model.stalled());
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod kind;
pub mod model;
pub mod physics;
pub mod registry;
pub mod state;
pub mod static_data;
pub mod sync;
pub mod traits;

// Re-exports
pub use clock::{HostClock, TimeSource};
pub use config::{CorrectedConfig, KirchhoffFit, StallConfig, ThirdGenConfig};
pub use error::{StallError, StallResult};
pub use kind::ModelKind;
pub use model::DynamicStall;
pub use registry::{ModelConstructor, ModelRegistry};
pub use state::{AeroCoefficients, Extension, StallState, StateHistory, ThirdGenLags};
pub use static_data::{StaticCache, StaticConstants};
pub use sync::{InMemoryExchange, ReplicaExchange, ReplicaSnapshot};
pub use traits::DynamicStallModel;
