//! Line-oriented region scanner for smali files.
//!
//! Smali is flat enough that methods can be located without a grammar: a
//! region opens on a line whose first token is `.method` (the last token is the
//! signature, e.g. `foo(I)V`) and closes on `.end method`. Constants are single
//! `.field` lines of the form `.field ... NAME:TYPE = value`.
//!
//! Chunks remember their byte range in the unit, so patched bodies are spliced
//! back by position. Two methods with byte-identical bodies are each patched in
//! place.

use crate::patcher::StringPatcher;
use smalipatch_utils::errors::PatchError;
use std::ops::Range;
use tracing::{debug, trace};

/// Structural role of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `.method ... <signature>`
    RegionStart(&'a str),
    /// `.end method`
    RegionEnd,
    Content,
}

impl<'a> Line<'a> {
    /// Classifies a line (without its terminator).
    pub fn classify(line: &'a str) -> Self {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some(".method") => Self::RegionStart(fields.last().unwrap_or(".method")),
            Some(".end") if fields.next() == Some("method") => Self::RegionEnd,
            _ => Self::Content,
        }
    }
}

/// One method body found in a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub signature: &'a str,
    /// Byte range of the body within the unit, from the line after `.method`
    /// up to the start of the `.end method` line.
    pub range: Range<usize>,
    pub body: &'a str,
}

/// Collects the non-empty bodies of every method whose signature equals
/// `signature`, in file order.
pub fn method_chunks<'a>(unit: &'a str, signature: &str) -> Vec<Chunk<'a>> {
    let mut chunks = Vec::new();
    let mut open: Option<(&'a str, usize)> = None;
    let mut offset = 0;

    for raw in unit.split_inclusive('\n') {
        let line_start = offset;
        offset += raw.len();

        match Line::classify(raw) {
            Line::RegionStart(sig) => {
                if let Some((prev, _)) = open {
                    debug!("method {prev:?} not closed before {sig:?}, dropping it");
                }
                open = Some((sig, offset));
            }
            Line::RegionEnd => {
                let Some((sig, start)) = open.take() else {
                    continue;
                };
                if sig != signature {
                    continue;
                }
                if line_start == start {
                    trace!("skipping empty body of {sig:?}");
                    continue;
                }
                chunks.push(Chunk {
                    signature: sig,
                    range: start..line_start,
                    body: &unit[start..line_start],
                });
            }
            Line::Content => {}
        }
    }

    chunks
}

/// Runs `patchers` in sequence, each over every body of `signature`.
///
/// Each pass fails with [`PatchError::MethodNotFound`] if there is no such
/// method, and with [`PatchError::NoEffectiveChange`] if it leaves the unit
/// byte-identical (pure assertions such as `MustContain` are exempt).
pub fn patch_in_method(
    unit: &str,
    signature: &str,
    patchers: &[StringPatcher],
) -> Result<String, PatchError> {
    let mut out = unit.to_string();
    for patcher in patchers {
        out = method_pass(&out, signature, patcher)?;
    }
    Ok(out)
}

fn method_pass(unit: &str, signature: &str, patcher: &StringPatcher) -> Result<String, PatchError> {
    let chunks = method_chunks(unit, signature);
    if chunks.is_empty() {
        return Err(PatchError::MethodNotFound(signature.to_string()));
    }

    let patched = chunks
        .iter()
        .map(|chunk| {
            patcher
                .patch(chunk.body)
                .map_err(|source| PatchError::InMethod {
                    method: signature.to_string(),
                    source: Box::new(source),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = unit.to_string();
    for (chunk, body) in chunks.iter().zip(&patched).rev() {
        out.replace_range(chunk.range.clone(), body);
    }
    debug!("patched {} chunk(s) of {signature:?}", chunks.len());

    if out == unit && !patcher.is_assertion() {
        return Err(PatchError::NoEffectiveChange(signature.to_string()));
    }
    Ok(out)
}

/// Whether `line` is a `.field` declaration assigning `identifier`.
pub fn declares_constant(line: &str, identifier: &str) -> bool {
    let fields: Vec<&str> = line.split_whitespace().collect();
    fields.first() == Some(&".field")
        && fields.windows(2).any(|w| w[0] == identifier && w[1] == "=")
}

/// Runs `patcher` on every `.field` line that assigns `identifier`.
pub fn patch_in_constant(
    unit: &str,
    identifier: &str,
    patcher: &StringPatcher,
) -> Result<String, PatchError> {
    let mut found = false;
    let mut lines = Vec::new();

    for line in unit.split('\n') {
        if declares_constant(line, identifier) {
            found = true;
            let patched = patcher.patch(line).map_err(|source| PatchError::InConstant {
                constant: identifier.to_string(),
                source: Box::new(source),
            })?;
            lines.push(patched);
        } else {
            lines.push(line.to_string());
        }
    }

    if !found {
        return Err(PatchError::ConstantNotFound(identifier.to_string()));
    }
    Ok(lines.join("\n"))
}
