use clap::Args;
use smalipatch_patch::manifest::load_registry;
use smalipatch_patch::pass::{self, ApplyConfig};
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct ApplyArgs {
    /// Root of the decoded app (the directory apktool wrote)
    dir: PathBuf,

    /// Manifest files to load (repeatable)
    #[arg(short, long = "manifest", required = true)]
    manifests: Vec<PathBuf>,

    /// Also write the unified diff to this file
    #[arg(long)]
    diff: Option<PathBuf>,

    /// Don't print the diff to stdout
    #[arg(short, long)]
    quiet: bool,

    /// Patches to leave out (repeatable)
    #[arg(long)]
    skip: Vec<String>,

    /// Context lines around each change in the diff
    #[arg(long, default_value_t = 3)]
    context: usize,
}

impl super::Command for ApplyArgs {
    fn execute(self) -> Result<(), Box<dyn Error>> {
        if !self.dir.is_dir() {
            return Err(format!("{} is not a directory", self.dir.display()).into());
        }
        let registry = load_registry(&self.manifests)?;
        let cfg = ApplyConfig {
            skip: self.skip,
            context_lines: self.context,
        };

        let mut diff = Vec::new();
        let result = pass::run(&registry, &self.dir, &mut diff, &cfg);

        // Emit whatever was recorded, including the diff of a failed run.
        if !self.quiet {
            io::stdout().write_all(&diff)?;
        }
        if let Some(path) = &self.diff {
            fs::write(path, &diff)?;
        }

        let summary = result?;
        info!(
            "applied {} patch(es), skipped {}",
            summary.applied.len(),
            summary.skipped.len()
        );
        Ok(())
    }
}
