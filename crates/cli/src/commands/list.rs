use clap::Args;
use smalipatch_patch::manifest::load_registry;
use std::error::Error;
use std::path::PathBuf;

#[derive(Args)]
pub struct ListArgs {
    /// Manifest files to load (repeatable)
    #[arg(short, long = "manifest", required = true)]
    manifests: Vec<PathBuf>,

    /// Print a JSON array instead of one name per line
    #[arg(long)]
    json: bool,
}

impl super::Command for ListArgs {
    fn execute(self) -> Result<(), Box<dyn Error>> {
        let registry = load_registry(&self.manifests)?;
        if self.json {
            let listing: Vec<_> = registry
                .patches()
                .map(|p| {
                    serde_json::json!({
                        "name": p.name(),
                        "instructions": p.instructions().iter().map(|i| i.name()).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            for patch in registry.patches() {
                println!("{} ({} instruction(s))", patch.name(), patch.instructions().len());
            }
        }
        Ok(())
    }
}
