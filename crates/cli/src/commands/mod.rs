use clap::Subcommand;
use std::error::Error;

pub mod apply;
pub mod list;

#[derive(Subcommand)]
pub enum Cmd {
    /// Apply every patch from the manifests to a decoded app directory
    Apply(apply::ApplyArgs),

    /// List the patches defined by the manifests
    List(list::ListArgs),
}

pub trait Command {
    fn execute(self) -> Result<(), Box<dyn Error>>;
}

impl Command for Cmd {
    fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Cmd::Apply(args) => args.execute(),
            Cmd::List(args) => args.execute(),
        }
    }
}
