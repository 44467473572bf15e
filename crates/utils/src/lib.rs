//! Shared error types for the smalipatch crates.

pub mod errors;
