//! Atomic string transformations and their composition.

use crate::scanner;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use smalipatch_utils::errors::PatchError;
use std::fmt;
use std::sync::Arc;

/// Signature of a caller-supplied patcher.
pub type PatchFn = dyn Fn(&str) -> Result<String, PatchError> + Send + Sync;

/// A shared closure usable as a [`StringPatcher`].
#[derive(Clone)]
pub struct FnPatcher(Arc<PatchFn>);

impl fmt::Debug for FnPatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnPatcher(..)")
    }
}

/// A pure transformation of a unit of text which either produces new text or
/// fails.
///
/// Every searching variant fails with [`PatchError::NotFound`] naming the
/// literal or pattern when it is absent, so a stale patch can never silently
/// succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StringPatcher {
    /// Replaces every occurrence of `find`.
    ReplaceString { find: String, replace: String },
    /// Replaces every match of `pattern`. Unless `literal` is set, `$1`/`${name}`
    /// in `replace` expand to capture groups.
    ReplaceRegex {
        #[serde(with = "regex_serde")]
        pattern: Regex,
        replace: String,
        #[serde(default)]
        literal: bool,
    },
    /// Asserts that `text` is present without changing anything.
    MustContain { text: String },
    /// Appends `text` unconditionally.
    AppendString { text: String },
    /// Replaces the whole unit with `text`.
    ReplaceWith { text: String },
    /// Runs each patcher, in turn, on every method body named `signature`.
    InMethod {
        signature: String,
        patchers: Vec<StringPatcher>,
    },
    /// Runs `patcher` on the `.field` line(s) assigning `identifier`.
    InConstant {
        identifier: String,
        patcher: Box<StringPatcher>,
    },
    /// Arbitrary caller-supplied transformation.
    #[serde(skip)]
    Func(FnPatcher),
}

impl StringPatcher {
    /// Replaces all occurrences of `find` with `replace`.
    pub fn replace_string(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self::ReplaceString {
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// Inserts `insertion` after every occurrence of `find`.
    pub fn replace_string_append(find: impl Into<String>, insertion: &str) -> Self {
        let find = find.into();
        let replace = format!("{find}{insertion}");
        Self::ReplaceString { find, replace }
    }

    /// Inserts `insertion` before every occurrence of `find`.
    pub fn replace_string_prepend(find: impl Into<String>, insertion: &str) -> Self {
        let find = find.into();
        let replace = format!("{insertion}{find}");
        Self::ReplaceString { find, replace }
    }

    /// Replaces all matches of `pattern`, expanding capture references in `replace`.
    pub fn replace_regex(pattern: Regex, replace: impl Into<String>) -> Self {
        Self::ReplaceRegex {
            pattern,
            replace: replace.into(),
            literal: false,
        }
    }

    /// Replaces all matches of `pattern` with `replace` taken verbatim.
    pub fn replace_regex_literal(pattern: Regex, replace: impl Into<String>) -> Self {
        Self::ReplaceRegex {
            pattern,
            replace: replace.into(),
            literal: true,
        }
    }

    /// Fails unless `text` is present; never changes the unit.
    pub fn must_contain(text: impl Into<String>) -> Self {
        Self::MustContain { text: text.into() }
    }

    /// Appends `text` to the end of the unit.
    pub fn append_string(text: impl Into<String>) -> Self {
        Self::AppendString { text: text.into() }
    }

    /// Discards the unit and returns `text`.
    pub fn replace_with(text: impl Into<String>) -> Self {
        Self::ReplaceWith { text: text.into() }
    }

    /// Scopes `patchers` to the body of every method whose `.method` line ends
    /// with `signature` (e.g. `onCreate(Landroid/os/Bundle;)V`).
    pub fn in_method(signature: impl Into<String>, patchers: Vec<Self>) -> Self {
        Self::InMethod {
            signature: signature.into(),
            patchers,
        }
    }

    /// Scopes `patcher` to the declaration of a field such as `TEXT_SIZE_MIN:I`.
    pub fn in_constant(identifier: impl Into<String>, patcher: Self) -> Self {
        Self::InConstant {
            identifier: identifier.into(),
            patcher: Box::new(patcher),
        }
    }

    /// Wraps a closure as a patcher.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<String, PatchError> + Send + Sync + 'static,
    {
        Self::Func(FnPatcher(Arc::new(f)))
    }

    /// Whether this patcher only checks its input and never changes it.
    pub fn is_assertion(&self) -> bool {
        match self {
            Self::MustContain { .. } => true,
            Self::InMethod { patchers, .. } => patchers.iter().all(Self::is_assertion),
            Self::InConstant { patcher, .. } => patcher.is_assertion(),
            _ => false,
        }
    }

    /// Applies the patcher to `unit`.
    pub fn patch(&self, unit: &str) -> Result<String, PatchError> {
        match self {
            Self::ReplaceString { find, replace } => {
                if !unit.contains(find.as_str()) {
                    return Err(PatchError::NotFound(find.clone()));
                }
                Ok(unit.replace(find.as_str(), replace))
            }
            Self::ReplaceRegex {
                pattern,
                replace,
                literal,
            } => {
                if !pattern.is_match(unit) {
                    return Err(PatchError::NotFound(pattern.as_str().to_string()));
                }
                let out = if *literal {
                    pattern.replace_all(unit, NoExpand(replace.as_str()))
                } else {
                    pattern.replace_all(unit, replace.as_str())
                };
                Ok(out.into_owned())
            }
            Self::MustContain { text } => {
                if !unit.contains(text.as_str()) {
                    return Err(PatchError::NotFound(text.clone()));
                }
                Ok(unit.to_string())
            }
            Self::AppendString { text } => Ok(format!("{unit}{text}")),
            Self::ReplaceWith { text } => Ok(text.clone()),
            Self::InMethod {
                signature,
                patchers,
            } => scanner::patch_in_method(unit, signature, patchers),
            Self::InConstant {
                identifier,
                patcher,
            } => scanner::patch_in_constant(unit, identifier, patcher),
            Self::Func(FnPatcher(f)) => f(unit),
        }
    }
}

mod regex_serde {
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(super) fn serialize<S: Serializer>(re: &Regex, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(re.as_str())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Regex, D::Error> {
        let pattern = String::deserialize(d)?;
        Regex::new(&pattern).map_err(D::Error::custom)
    }
}
