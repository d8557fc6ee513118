use serde::{Deserialize, Serialize};
use std::fmt;

/// The registered model variants.
///
/// All variants share one state representation; the kind selects which
/// physics stages are overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Classic Leishman-Beddoes.
    LeishmanBeddoes,
    /// Third generation: pitch-rate lags, compressible impulsive terms and a
    /// vortex-modulated separation point.
    LeishmanBeddoes3G,
    /// Sheng-Galbraith-Coton corrected onset.
    LeishmanBeddoesSGC,
    /// SGC with variable-step lags and the Dyachuk corrections.
    LeishmanBeddoesShengDyachuk,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::LeishmanBeddoes,
        ModelKind::LeishmanBeddoes3G,
        ModelKind::LeishmanBeddoesSGC,
        ModelKind::LeishmanBeddoesShengDyachuk,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::LeishmanBeddoes => "LeishmanBeddoes",
            ModelKind::LeishmanBeddoes3G => "LeishmanBeddoes3G",
            ModelKind::LeishmanBeddoesSGC => "LeishmanBeddoesSGC",
            ModelKind::LeishmanBeddoesShengDyachuk => "LeishmanBeddoesShengDyachuk",
        }
    }

    /// SGC and its derivatives.
    pub fn is_corrected(self) -> bool {
        matches!(
            self,
            ModelKind::LeishmanBeddoesSGC | ModelKind::LeishmanBeddoesShengDyachuk
        )
    }

    /// Lags weighted with the mean of the current and previous step.
    pub fn variable_step(self) -> bool {
        self == ModelKind::LeishmanBeddoesShengDyachuk
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = ModelKind::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
        assert_eq!(ModelKind::LeishmanBeddoes3G.to_string(), "LeishmanBeddoes3G");
    }

    #[test]
    fn corrected_family() {
        assert!(!ModelKind::LeishmanBeddoes.is_corrected());
        assert!(ModelKind::LeishmanBeddoesSGC.is_corrected());
        assert!(ModelKind::LeishmanBeddoesShengDyachuk.variable_step());
        assert!(!ModelKind::LeishmanBeddoesSGC.variable_step());
    }
}
