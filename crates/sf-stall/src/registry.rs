//! Name-keyed model construction.

use crate::clock::TimeSource;
use crate::config::StallConfig;
use crate::error::{StallError, StallResult};
use crate::kind::ModelKind;
use crate::model::DynamicStall;
use crate::traits::DynamicStallModel;
use sf_profile::ProfileData;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type ModelConstructor =
    fn(StallConfig, ProfileData, Arc<dyn TimeSource>) -> StallResult<Box<dyn DynamicStallModel>>;

fn boxed(
    kind: ModelKind,
    config: StallConfig,
    profile: ProfileData,
    clock: Arc<dyn TimeSource>,
) -> StallResult<Box<dyn DynamicStallModel>> {
    Ok(Box::new(DynamicStall::new(kind, config, profile, clock)?))
}

fn classic(
    c: StallConfig,
    p: ProfileData,
    t: Arc<dyn TimeSource>,
) -> StallResult<Box<dyn DynamicStallModel>> {
    boxed(ModelKind::LeishmanBeddoes, c, p, t)
}

fn third_gen(
    c: StallConfig,
    p: ProfileData,
    t: Arc<dyn TimeSource>,
) -> StallResult<Box<dyn DynamicStallModel>> {
    boxed(ModelKind::LeishmanBeddoes3G, c, p, t)
}

fn sgc(
    c: StallConfig,
    p: ProfileData,
    t: Arc<dyn TimeSource>,
) -> StallResult<Box<dyn DynamicStallModel>> {
    boxed(ModelKind::LeishmanBeddoesSGC, c, p, t)
}

fn sheng_dyachuk(
    c: StallConfig,
    p: ProfileData,
    t: Arc<dyn TimeSource>,
) -> StallResult<Box<dyn DynamicStallModel>> {
    boxed(ModelKind::LeishmanBeddoesShengDyachuk, c, p, t)
}

/// Constructors by model name. Hosts validate the configured name once at
/// startup and create one model per section.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    constructors: BTreeMap<String, ModelConstructor>,
}

impl ModelRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in variants.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ModelKind::LeishmanBeddoes.name(), classic);
        registry.register(ModelKind::LeishmanBeddoes3G.name(), third_gen);
        registry.register(ModelKind::LeishmanBeddoesSGC.name(), sgc);
        registry.register(ModelKind::LeishmanBeddoesShengDyachuk.name(), sheng_dyachuk);
        registry
    }

    /// Add or replace a constructor. Returns `true` when a name was replaced.
    pub fn register(&mut self, name: impl Into<String>, constructor: ModelConstructor) -> bool {
        self.constructors.insert(name.into(), constructor).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Fail fast on an unknown name.
    pub fn validate(&self, name: &str) -> StallResult<()> {
        self.lookup(name).map(|_| ())
    }

    pub fn create(
        &self,
        name: &str,
        config: StallConfig,
        profile: ProfileData,
        clock: Arc<dyn TimeSource>,
    ) -> StallResult<Box<dyn DynamicStallModel>> {
        let constructor = self.lookup(name)?;
        constructor(config, profile, clock)
    }

    fn lookup(&self, name: &str) -> StallResult<ModelConstructor> {
        self.constructors
            .get(name)
            .copied()
            .ok_or_else(|| StallError::UnknownModel {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::HostClock;
    use sf_profile::PolarTable;

    fn profile() -> ProfileData {
        let table = PolarTable::new(vec![
            [-10.0, -1.0, 0.02, 0.0],
            [0.0, 0.0, 0.01, 0.0],
            [10.0, 1.0, 0.02, 0.0],
            [20.0, 0.8, 0.2, -0.05],
        ])
        .unwrap();
        ProfileData::new("scenario", table)
    }

    #[test]
    fn defaults_cover_every_kind() {
        let registry = ModelRegistry::with_defaults();
        for kind in ModelKind::ALL {
            assert!(registry.validate(kind.name()).is_ok());
            let model = registry
                .create(
                    kind.name(),
                    StallConfig::new(1.0),
                    profile(),
                    Arc::new(HostClock::default()),
                )
                .unwrap();
            assert_eq!(model.kind(), kind);
            assert_eq!(model.name(), kind.name());
        }
        assert_eq!(registry.names().len(), 4);
    }

    #[test]
    fn unknown_name_lists_known_models() {
        let registry = ModelRegistry::with_defaults();
        let err = registry.validate("Beddoes").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Beddoes"));
        assert!(msg.contains("LeishmanBeddoesSGC"));
    }

    #[test]
    fn register_replaces() {
        let mut registry = ModelRegistry::new();
        assert!(!registry.register("custom", classic));
        assert!(registry.register("custom", sgc));
        let model = registry
            .create(
                "custom",
                StallConfig::new(1.0),
                profile(),
                Arc::new(HostClock::default()),
            )
            .unwrap();
        assert_eq!(model.kind(), ModelKind::LeishmanBeddoesSGC);
    }
}
