use crate::instruction::WorkTree;
use crate::registry::PatchRegistry;
use serde::{Deserialize, Serialize};
use smalipatch_core::diff::DiffRenderer;
use smalipatch_utils::errors::ApplyError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Configuration for a patch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Names of registered patches to leave out of the run
    pub skip: Vec<String>,
    /// Context lines around each change in the recorded diff
    pub context_lines: usize,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            skip: Vec::new(),
            context_lines: 3,
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

/// Applies every registered patch, in name order, to the tree at `root`.
///
/// The first failing patch aborts the run. Whatever was applied before it
/// stays on disk.
pub fn run(
    registry: &PatchRegistry,
    root: &Path,
    diff: &mut dyn Write,
    cfg: &ApplyConfig,
) -> Result<ApplySummary, ApplyError> {
    for name in &cfg.skip {
        if registry.get(name).is_none() {
            warn!("skip: no patch named {name:?}");
        }
    }

    let mut tree = WorkTree::new(root, diff).with_renderer(DiffRenderer::new(cfg.context_lines));
    let mut summary = ApplySummary::default();
    let total = registry.len();

    for (i, patch) in registry.patches().enumerate() {
        if cfg.skip.iter().any(|s| s == patch.name()) {
            info!("[{}/{total}] {} (skipped)", i + 1, patch.name());
            summary.skipped.push(patch.name().to_string());
            continue;
        }
        info!("[{}/{total}] {}", i + 1, patch.name());
        patch.apply_in(&mut tree)?;
        summary.applied.push(patch.name().to_string());
    }

    Ok(summary)
}
