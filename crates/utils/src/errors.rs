use thiserror::Error;

/// Error type for string patchers.
#[derive(Debug, Error)]
pub enum PatchError {
    /// A literal or regex searched for by a patcher is absent from the unit.
    #[error("could not find {0:?}")]
    NotFound(String),
    /// No method body with the given signature exists in the unit.
    #[error("could not find method {0:?}")]
    MethodNotFound(String),
    /// No `.field` declaration assigns the given identifier.
    #[error("could not find constant {0:?}")]
    ConstantNotFound(String),
    /// Every matching method ran cleanly but the unit came out byte-identical.
    #[error("identical output in method {0:?}")]
    NoEffectiveChange(String),
    /// A patcher failed while running inside a method body.
    #[error("could not run patcher in method {method:?}: {source}")]
    InMethod {
        method: String,
        #[source]
        source: Box<PatchError>,
    },
    /// A patcher failed while running on a constant declaration.
    #[error("replace constant {constant:?}: {source}")]
    InConstant {
        constant: String,
        #[source]
        source: Box<PatchError>,
    },
    /// Failure reported by a caller-supplied patcher.
    #[error("{0}")]
    Other(String),
}

impl PatchError {
    /// Returns the innermost error, skipping region wrappers.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::InMethod { source, .. } | Self::InConstant { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Error type for the helpers used to build smali fragments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("text does not start on a new line")]
    MissingLeadingNewline,
    #[error("line {0} is not indented with the base indentation")]
    NotIndented(usize),
    /// A fragment template failed to parse or render.
    #[error("template: {0}")]
    Template(String),
}

/// Error type for instructions operating on the working tree.
#[derive(Debug, Error)]
pub enum InstructionError {
    /// Filesystem read/write/delete/mkdir failure.
    #[error("{op} {path:?}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A stage of a file's patcher pipeline failed.
    #[error("patch {path:?}: patcher {index}: {source}")]
    Patcher {
        path: String,
        index: usize,
        #[source]
        source: PatchError,
    },
    /// A file handed to a text patcher is not valid UTF-8.
    #[error("{0:?} is not a UTF-8 text file")]
    NotText(String),
    /// The diff sink rejected a write.
    #[error("write diff: {0}")]
    DiffSink(#[source] std::io::Error),
    /// A resource id was requested for a type with no existing entries.
    #[error("no existing resources found with type {0:?}")]
    ResourceTypeSeedMissing(String),
    /// The public resource table could not be understood.
    #[error("parse existing resources: {0}")]
    ResourceTable(String),
    /// A child of a composite instruction failed.
    #[error("inst {index}: {source}")]
    Sequence {
        index: usize,
        #[source]
        source: Box<InstructionError>,
    },
}

/// Error type for applying a named patch.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("apply patch {patch:?}: inst {index}: {source}")]
    Instruction {
        patch: String,
        index: usize,
        #[source]
        source: InstructionError,
    },
}

/// Error type for building a patch registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("missing patch name")]
    EmptyName,
    #[error("duplicate patch {0:?}")]
    DuplicatePatch(String),
}

/// Errors that can occur while loading patch manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not read manifest '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read source file '{path}': {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
