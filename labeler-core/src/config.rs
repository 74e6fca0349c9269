//! Localização dos três recursos de padrões.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternPaths {
    pub pre_negation_uncertainty: PathBuf,
    pub negation: PathBuf,
    pub post_negation_uncertainty: PathBuf,
}

impl PatternPaths {
    pub const PRE_NEGATION_UNCERTAINTY_FILE: &'static str = "pre_negation_uncertainty.json";
    pub const NEGATION_FILE: &'static str = "negation.json";
    pub const POST_NEGATION_UNCERTAINTY_FILE: &'static str = "post_negation_uncertainty.json";

    /// Os três arquivos, com os nomes padrão, dentro de `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            pre_negation_uncertainty: dir.join(Self::PRE_NEGATION_UNCERTAINTY_FILE),
            negation: dir.join(Self::NEGATION_FILE),
            post_negation_uncertainty: dir.join(Self::POST_NEGATION_UNCERTAINTY_FILE),
        }
    }

    /// Regras distribuídas junto com o crate (`labeler-core/patterns/`).
    pub fn bundled() -> Self {
        Self::from_dir(Path::new(env!("CARGO_MANIFEST_DIR")).join("patterns"))
    }
}
