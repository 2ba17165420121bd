//! Knowledge-base bootstrap: prefer the compiled cache, else compile and persist it.

use std::path::{Path, PathBuf};

use crate::brain::{Brain, BrainError};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Neither a compiled cache nor a usable rule-source directory exists.
    #[error("no brain cache at {} and no rule files in {}", cache.display(), rules.display())]
    NoRuleSource { cache: PathBuf, rules: PathBuf },
    #[error(transparent)]
    Brain(#[from] BrainError),
}

/// How the brain was obtained (logged at startup; reported by `--verify`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootSource {
    /// Loaded from the compiled cache.
    Cache,
    /// Compiled from rule files; the cache was written.
    Compiled,
    /// Compiled from rule files; writing the cache failed.
    CompiledUncached,
}

/// Produces the process brain. Fatal only when there is nothing to build it from.
///
/// An unreadable cache is recompiled from `rules_dir` when rules exist.
pub fn bootstrap(rules_dir: &Path, brain_path: &Path) -> Result<(Brain, BootSource), BootstrapError> {
    if brain_path.exists() {
        match Brain::load(brain_path) {
            Ok(brain) => return Ok((brain, BootSource::Cache)),
            Err(e) if rules_dir.is_dir() => {
                tracing::warn!(
                    target: "parlor::bootstrap",
                    error = %e,
                    "Brain cache unusable; recompiling from {}",
                    rules_dir.display()
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    if !rules_dir.is_dir() {
        return Err(no_source(rules_dir, brain_path));
    }
    let brain = match Brain::compile_dir(rules_dir) {
        Ok(brain) => brain,
        Err(BrainError::NoRuleFiles(_)) => return Err(no_source(rules_dir, brain_path)),
        Err(e) => return Err(e.into()),
    };

    match brain.save(brain_path) {
        Ok(()) => Ok((brain, BootSource::Compiled)),
        Err(e) => {
            tracing::warn!(
                target: "parlor::bootstrap",
                error = %e,
                "Could not write brain cache; next start will recompile"
            );
            Ok((brain, BootSource::CompiledUncached))
        }
    }
}

fn no_source(rules_dir: &Path, brain_path: &Path) -> BootstrapError {
    BootstrapError::NoRuleSource {
        cache: brain_path.to_path_buf(),
        rules: rules_dir.to_path_buf(),
    }
}
