//! Instructions, named patches and the registry that applies them to a
//! decompiled app tree.

pub mod instruction;
pub mod manifest;
pub mod pass;
pub mod registry;
pub mod resource;

pub use instruction::{
    DeleteFile, PatchFile, Sequence, WorkTree, WriteFile, delete_file, patch_file, patch_files,
    write_file, write_file_string,
};
pub use pass::{ApplyConfig, ApplySummary};
pub use registry::{Patch, PatchRegistry};
pub use resource::{DefineResource, define_resource};

use smalipatch_utils::errors::InstructionError;
use std::fmt;

/// One atomic operation on the working tree.
///
/// Instructions read and write files relative to the tree root and record
/// every change in the tree's diff sink.
pub trait Instruction: fmt::Debug + Send + Sync {
    /// Returns the instruction's name for logging.
    fn name(&self) -> &'static str;
    /// Applies the instruction to `tree`.
    fn apply(&self, tree: &mut WorkTree<'_>) -> Result<(), InstructionError>;
}
