//! Helpers for preparing text before and while patching.

use minijinja::Environment;
use serde::Serialize;
use smalipatch_utils::errors::TextError;

/// Converts CRLF line endings to LF.
///
/// apktool emits CRLF on Windows; patchers are always written against LF.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Turns an indented raw literal into a smali fragment.
///
/// The literal must start with a newline (which is dropped). The run of tabs at
/// the very end of the literal is the base indentation: it is removed from every
/// line, each further leading tab becomes four spaces, and whitespace-only lines
/// become empty.
///
/// ```
/// use smalipatch_core::text::fix_indent;
///
/// let s = fix_indent("\n\t\tconst/4 v0, 0x1\n\t\t\treturn v0\n\t\t").unwrap();
/// assert_eq!(s, "const/4 v0, 0x1\n    return v0\n");
/// ```
pub fn fix_indent(text: &str) -> Result<String, TextError> {
    if text.is_empty() {
        return Ok(String::new());
    }
    let text = text
        .strip_prefix('\n')
        .ok_or(TextError::MissingLeadingNewline)?;

    let trimmed = text.trim_end_matches('\t');
    let base = text.len() - trimmed.len();

    let mut out = String::with_capacity(trimmed.len());
    for (n, line) in trimmed.lines().enumerate() {
        if !line.trim().is_empty() {
            let rest = line
                .get(..base)
                .filter(|indent| indent.bytes().all(|b| b == b'\t'))
                .map(|_| &line[base..])
                .ok_or(TextError::NotIndented(n + 1))?;
            let content = rest.trim_start_matches('\t');
            if !content.is_empty() {
                let extra = rest.len() - content.len();
                out.push_str(&"    ".repeat(extra));
                out.push_str(content);
            }
        }
        out.push('\n');
    }
    Ok(out)
}

/// Renders a jinja-style fragment template against `data`.
///
/// Besides the builtins, templates get `add_int(a, b)` for numbering
/// registers. A trailing newline in the template is kept so the result can be
/// passed straight to [`fix_indent`].
pub fn render_template<S: Serialize>(template: &str, data: &S) -> Result<String, TextError> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_function("add_int", |a: i64, b: i64| a + b);
    env.render_str(template, data)
        .map_err(|e| TextError::Template(e.to_string()))
}
