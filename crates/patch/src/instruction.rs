//! File-level instructions and the working tree they operate on.

use crate::Instruction;
use smalipatch_core::StringPatcher;
use smalipatch_core::diff::DiffRenderer;
use smalipatch_core::text::normalize_line_endings;
use smalipatch_utils::errors::InstructionError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The decompiled app directory being patched, plus the sink collecting the
/// unified diff of every change made to it.
pub struct WorkTree<'a> {
    root: &'a Path,
    sink: &'a mut dyn Write,
    renderer: DiffRenderer,
}

impl std::fmt::Debug for WorkTree<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkTree")
            .field("root", &self.root)
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

impl<'a> WorkTree<'a> {
    pub fn new(root: &'a Path, sink: &'a mut dyn Write) -> Self {
        Self {
            root,
            sink,
            renderer: DiffRenderer::default(),
        }
    }

    /// Uses `renderer` for all diffs written from now on.
    pub fn with_renderer(mut self, renderer: DiffRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub const fn root(&self) -> &Path {
        self.root
    }

    pub const fn renderer(&self) -> DiffRenderer {
        self.renderer
    }

    /// Resolves a slash-separated, tree-relative path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .fold(self.root.to_path_buf(), |p, c| p.join(c))
    }

    /// Appends rendered diff text to the sink.
    pub fn record(&mut self, diff: &str) -> Result<(), InstructionError> {
        self.sink
            .write_all(diff.as_bytes())
            .map_err(InstructionError::DiffSink)
    }

    /// Reads the text file at `path`, normalizes its line endings, passes it to
    /// `edit`, records the diff and writes the result back.
    ///
    /// The diff headers are recorded even when nothing changed; the file itself
    /// is only rewritten if the text differs.
    pub fn edit_text<F>(&mut self, path: &str, edit: F) -> Result<(), InstructionError>
    where
        F: FnOnce(&str) -> Result<String, InstructionError>,
    {
        let full = self.resolve(path);
        let raw = fs::read(&full).map_err(|source| io_error("read", path, source))?;
        let raw = String::from_utf8(raw).map_err(|_| InstructionError::NotText(path.to_string()))?;
        let original = normalize_line_endings(&raw);

        let patched = edit(&original)?;

        let diff = self.renderer.modified(path, &original, &patched);
        self.record(&diff)?;

        if patched == original {
            debug!("{path}: unchanged");
            return Ok(());
        }
        fs::write(&full, patched).map_err(|source| io_error("write", path, source))?;
        debug!("{path}: written");
        Ok(())
    }
}

fn io_error(op: &'static str, path: &str, source: std::io::Error) -> InstructionError {
    InstructionError::Io {
        op,
        path: path.to_string(),
        source,
    }
}

/// Creates or overwrites a file.
#[derive(Debug, Clone)]
pub struct WriteFile {
    pub path: String,
    pub content: Vec<u8>,
}

impl Instruction for WriteFile {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn apply(&self, tree: &mut WorkTree<'_>) -> Result<(), InstructionError> {
        let diff = tree.renderer().created(&self.path, &self.content);
        tree.record(&diff)?;

        let full = tree.resolve(&self.path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error("mkdir", &self.path, source))?;
        }
        fs::write(&full, &self.content).map_err(|source| io_error("write", &self.path, source))?;
        debug!("{}: wrote {} bytes", self.path, self.content.len());
        Ok(())
    }
}

/// Removes a file, failing if it does not exist.
#[derive(Debug, Clone)]
pub struct DeleteFile {
    pub path: String,
}

impl Instruction for DeleteFile {
    fn name(&self) -> &'static str {
        "delete_file"
    }

    fn apply(&self, tree: &mut WorkTree<'_>) -> Result<(), InstructionError> {
        let diff = tree.renderer().deleted(&self.path);
        tree.record(&diff)?;

        let full = tree.resolve(&self.path);
        fs::remove_file(&full).map_err(|source| io_error("remove", &self.path, source))?;
        debug!("{}: removed", self.path);
        Ok(())
    }
}

/// Runs the same patcher pipeline over one or more text files.
///
/// Targets must be UTF-8; anything else fails with
/// [`InstructionError::NotText`] before a patcher runs.
///
/// A failing stage aborts the whole instruction; files already processed
/// keep their new content.
#[derive(Debug, Clone)]
pub struct PatchFile {
    pub paths: Vec<String>,
    pub patchers: Vec<StringPatcher>,
}

impl PatchFile {
    /// Runs the pipeline on `text`, reporting the failing stage against `path`.
    pub fn run_pipeline(&self, path: &str, text: &str) -> Result<String, InstructionError> {
        let mut out = text.to_string();
        for (index, patcher) in self.patchers.iter().enumerate() {
            out = patcher
                .patch(&out)
                .map_err(|source| InstructionError::Patcher {
                    path: path.to_string(),
                    index,
                    source,
                })?;
        }
        Ok(out)
    }
}

impl Instruction for PatchFile {
    fn name(&self) -> &'static str {
        "patch_file"
    }

    fn apply(&self, tree: &mut WorkTree<'_>) -> Result<(), InstructionError> {
        for path in &self.paths {
            debug!("{path}: running {} patcher(s)", self.patchers.len());
            tree.edit_text(path, |text| self.run_pipeline(path, text))?;
        }
        Ok(())
    }
}

/// Runs child instructions in order, e.g. writing assets before patching the
/// code that loads them.
#[derive(Debug, Default)]
pub struct Sequence {
    pub instructions: Vec<Box<dyn Instruction>>,
}

impl Instruction for Sequence {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn apply(&self, tree: &mut WorkTree<'_>) -> Result<(), InstructionError> {
        for (index, inst) in self.instructions.iter().enumerate() {
            inst.apply(tree)
                .map_err(|source| InstructionError::Sequence {
                    index,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}

/// Writes `content` to `path`, creating parent directories.
pub fn write_file(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Box<dyn Instruction> {
    Box::new(WriteFile {
        path: path.into(),
        content: content.into(),
    })
}

/// [`write_file`] for text content.
pub fn write_file_string(path: impl Into<String>, content: &str) -> Box<dyn Instruction> {
    write_file(path, content.as_bytes())
}

/// Removes the file at `path`.
pub fn delete_file(path: impl Into<String>) -> Box<dyn Instruction> {
    Box::new(DeleteFile { path: path.into() })
}

/// Runs `patchers` over a single file.
pub fn patch_file(path: impl Into<String>, patchers: Vec<StringPatcher>) -> Box<dyn Instruction> {
    Box::new(PatchFile {
        paths: vec![path.into()],
        patchers,
    })
}

/// Runs the same `patchers` over each of `paths`.
pub fn patch_files<I, S>(paths: I, patchers: Vec<StringPatcher>) -> Box<dyn Instruction>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Box::new(PatchFile {
        paths: paths.into_iter().map(Into::into).collect(),
        patchers,
    })
}
