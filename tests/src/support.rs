//! Fixtures and a minimal unified-diff applier.

use smalipatch_patch::{ApplyConfig, ApplySummary, PatchRegistry, pass};
use smalipatch_utils::errors::ApplyError;
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Installs a test-writer subscriber once per process.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// A throwaway decoded-app directory.
pub struct App {
    dir: TempDir,
}

impl App {
    pub fn new() -> Self {
        init_tracing();
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.dir.path().join(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.dir.path().join(rel).exists()
    }

    /// Runs every patch in `registry` and returns the recorded diff.
    pub fn apply(&self, registry: &PatchRegistry) -> (Result<ApplySummary, ApplyError>, String) {
        let mut sink = Vec::new();
        let res = pass::run(registry, self.root(), &mut sink, &ApplyConfig::default());
        (res, String::from_utf8(sink).unwrap())
    }
}

/// One file section of a unified diff.
#[derive(Debug)]
pub struct FileDiff {
    pub old: String,
    pub new: String,
    pub binary: bool,
    pub hunks: Vec<Hunk>,
}

#[derive(Debug)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub lines: Vec<String>,
}

fn parse_range(range: &str) -> (usize, usize) {
    match range.split_once(',') {
        Some((start, len)) => (start.parse().unwrap(), len.parse().unwrap()),
        None => (range.parse().unwrap(), 1),
    }
}

/// Splits a multi-file diff into per-file sections, counting hunk lines so
/// content that looks like a header is not mistaken for one.
pub fn parse_diff(diff: &str) -> Vec<FileDiff> {
    let lines: Vec<&str> = diff.split('\n').collect();
    let mut files = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(old) = lines[i].strip_prefix("--- ") else {
            assert!(lines[i].is_empty(), "unexpected diff line {:?}", lines[i]);
            i += 1;
            continue;
        };
        let new = lines[i + 1].strip_prefix("+++ ").expect("+++ header");
        i += 2;

        let mut file = FileDiff {
            old: old.to_string(),
            new: new.to_string(),
            binary: false,
            hunks: Vec::new(),
        };
        if lines.get(i) == Some(&"Binary file") {
            file.binary = true;
            i += 1;
        }

        while let Some(header) = lines.get(i).and_then(|l| l.strip_prefix("@@ -")) {
            let (ranges, _) = header.split_once(" @@").unwrap();
            let (old_range, new_range) = ranges.split_once(" +").unwrap();
            let (old_start, old_len) = parse_range(old_range);
            let (_, new_len) = parse_range(new_range);
            i += 1;

            let mut hunk = Hunk {
                old_start,
                old_len,
                lines: Vec::new(),
            };
            let (mut seen_old, mut seen_new) = (0, 0);
            while seen_old < old_len
                || seen_new < new_len
                || lines.get(i).is_some_and(|l| l.starts_with('\\'))
            {
                let line = lines[i];
                i += 1;
                match line.as_bytes().first() {
                    Some(b' ') => {
                        seen_old += 1;
                        seen_new += 1;
                    }
                    Some(b'-') => seen_old += 1,
                    Some(b'+') => seen_new += 1,
                    Some(b'\\') => {}
                    _ => panic!("bad hunk line {line:?}"),
                }
                hunk.lines.push(line.to_string());
            }
            file.hunks.push(hunk);
        }
        files.push(file);
    }
    files
}

/// Applies the hunks of `file` to `old`, checking context and removals.
pub fn apply_file_diff(old: &str, file: &FileDiff) -> String {
    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let mut out = String::new();
    let mut cursor = 0;

    for hunk in &file.hunks {
        let start = if hunk.old_len == 0 {
            hunk.old_start
        } else {
            hunk.old_start - 1
        };
        for line in &old_lines[cursor..start] {
            out.push_str(line);
        }
        cursor = start;

        let mut last = b' ';
        for line in &hunk.lines {
            let (tag, text) = (line.as_bytes()[0], &line[1..]);
            match tag {
                b' ' | b'-' => {
                    let orig = old_lines[cursor];
                    assert_eq!(orig.trim_end_matches('\n'), text, "context mismatch");
                    if tag == b' ' {
                        out.push_str(orig);
                    }
                    cursor += 1;
                }
                b'+' => {
                    out.push_str(text);
                    out.push('\n');
                }
                b'\\' => {
                    if last == b'+' {
                        out.pop();
                    }
                    continue;
                }
                _ => unreachable!(),
            }
            last = tag;
        }
    }
    for line in &old_lines[cursor..] {
        out.push_str(line);
    }
    out
}

/// Finds the section for the file at tree-relative `path`.
pub fn section<'a>(files: &'a [FileDiff], path: &str) -> &'a FileDiff {
    let label = format!("b/{path}");
    files
        .iter()
        .find(|f| f.new == label)
        .unwrap_or_else(|| panic!("no diff section for {path}"))
}
