//! Text-level building blocks for patching disassembled Android apps.
//!
//! [`patcher::StringPatcher`] values are small, composable edits over a unit of
//! text. [`scanner`] narrows a patcher down to a single method body or constant
//! declaration of a smali file, and [`diff`] renders the audit trail.

pub mod diff;
pub mod patcher;
pub mod scanner;
pub mod text;

pub use patcher::StringPatcher;
pub use smalipatch_utils::errors::PatchError;
