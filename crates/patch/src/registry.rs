use crate::Instruction;
use crate::instruction::WorkTree;
use smalipatch_utils::errors::{ApplyError, RegistryError};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// A named, ordered list of instructions making up one feature.
#[derive(Debug)]
pub struct Patch {
    name: String,
    instructions: Vec<Box<dyn Instruction>>,
}

impl Patch {
    pub fn new(name: impl Into<String>, instructions: Vec<Box<dyn Instruction>>) -> Self {
        Self {
            name: name.into(),
            instructions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &[Box<dyn Instruction>] {
        &self.instructions
    }

    /// Applies the patch to the tree at `root`, writing diffs to `diff`.
    pub fn apply(&self, root: &Path, diff: &mut dyn Write) -> Result<(), ApplyError> {
        self.apply_in(&mut WorkTree::new(root, diff))
    }

    /// Runs the instructions in order, stopping at the first failure.
    pub fn apply_in(&self, tree: &mut WorkTree<'_>) -> Result<(), ApplyError> {
        for (index, inst) in self.instructions.iter().enumerate() {
            debug!("{}: inst {index} ({})", self.name, inst.name());
            inst.apply(tree).map_err(|source| ApplyError::Instruction {
                patch: self.name.clone(),
                index,
                source,
            })?;
        }
        Ok(())
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The set of known patches, kept sorted by name.
///
/// Built once by the composition root and handed to the driver; definitions
/// spread over many modules each register into it.
#[derive(Debug, Default)]
pub struct PatchRegistry {
    patches: BTreeMap<String, Patch>,
}

impl PatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a patch built from `instructions`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        instructions: Vec<Box<dyn Instruction>>,
    ) -> Result<&mut Self, RegistryError> {
        self.add(Patch::new(name, instructions))
    }

    /// Adds a patch, rejecting empty and already-registered names.
    pub fn add(&mut self, patch: Patch) -> Result<&mut Self, RegistryError> {
        if patch.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.patches.contains_key(&patch.name) {
            return Err(RegistryError::DuplicatePatch(patch.name));
        }
        self.patches.insert(patch.name.clone(), patch);
        Ok(self)
    }

    /// All patches in application (lexicographic name) order.
    pub fn patches(&self) -> impl ExactSizeIterator<Item = &Patch> {
        self.patches.values()
    }

    pub fn get(&self, name: &str) -> Option<&Patch> {
        self.patches.get(name)
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}
