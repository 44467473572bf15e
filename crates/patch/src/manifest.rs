//! JSON manifests describing patches as data.
//!
//! ```json
//! { "patches": [
//!     { "name": "debuggable", "instructions": [
//!         { "op": "patch_file", "paths": ["smali/com/example/Web.smali"], "patchers": [
//!             { "op": "in_method", "signature": "<clinit>()V", "patchers": [
//!                 { "op": "replace_string", "find": "return-void", "replace": "nop\n    return-void" }
//!             ]}
//!         ]}
//!     ]}
//! ]}
//! ```

use crate::Instruction;
use crate::instruction::{DeleteFile, PatchFile, Sequence, WriteFile};
use crate::registry::{Patch, PatchRegistry};
use crate::resource::DefineResource;
use serde::{Deserialize, Serialize};
use smalipatch_core::StringPatcher;
use smalipatch_utils::errors::ManifestError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A set of patch definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub patches: Vec<PatchDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchDef {
    pub name: String,
    pub instructions: Vec<InstructionDef>,
}

/// Serializable form of the built-in instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InstructionDef {
    WriteFile {
        path: String,
        content: String,
    },
    /// Writes the bytes of a host file, resolved against the manifest's directory.
    CopyFile {
        path: String,
        source: PathBuf,
    },
    DeleteFile {
        path: String,
    },
    PatchFile {
        paths: Vec<String>,
        patchers: Vec<StringPatcher>,
    },
    DefineResource {
        r_path: String,
        resource_type: String,
        name: String,
    },
    Sequence {
        instructions: Vec<InstructionDef>,
    },
}

impl InstructionDef {
    /// Builds the instruction; relative `copy_file` sources are taken from `base`.
    pub fn build(self, base: &Path) -> Result<Box<dyn Instruction>, ManifestError> {
        Ok(match self {
            Self::WriteFile { path, content } => Box::new(WriteFile {
                path,
                content: content.into_bytes(),
            }),
            Self::CopyFile { path, source } => {
                let source = base.join(source);
                let content = fs::read(&source).map_err(|e| ManifestError::Source {
                    path: source.display().to_string(),
                    source: e,
                })?;
                Box::new(WriteFile { path, content })
            }
            Self::DeleteFile { path } => Box::new(DeleteFile { path }),
            Self::PatchFile { paths, patchers } => Box::new(PatchFile { paths, patchers }),
            Self::DefineResource {
                r_path,
                resource_type,
                name,
            } => Box::new(DefineResource {
                r_path,
                resource_type,
                name,
            }),
            Self::Sequence { instructions } => Box::new(Sequence {
                instructions: instructions
                    .into_iter()
                    .map(|def| def.build(base))
                    .collect::<Result<_, _>>()?,
            }),
        })
    }
}

impl Manifest {
    pub fn parse(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let json = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&json)
    }

    /// Builds every patch and adds it to `registry`.
    pub fn register_into(
        self,
        registry: &mut PatchRegistry,
        base: &Path,
    ) -> Result<(), ManifestError> {
        for def in self.patches {
            let instructions = def
                .instructions
                .into_iter()
                .map(|inst| inst.build(base))
                .collect::<Result<Vec<_>, _>>()?;
            registry.add(Patch::new(def.name, instructions))?;
        }
        Ok(())
    }
}

/// Loads several manifest files into one registry. Patch names must be unique
/// across all of them.
pub fn load_registry<P: AsRef<Path>>(paths: &[P]) -> Result<PatchRegistry, ManifestError> {
    let mut registry = PatchRegistry::new();
    for path in paths {
        let path = path.as_ref();
        let base = path.parent().unwrap_or(Path::new("."));
        let before = registry.len();
        Manifest::load(path)?.register_into(&mut registry, base)?;
        debug!(
            "{}: {} patch(es)",
            path.display(),
            registry.len() - before
        );
    }
    Ok(registry)
}
