//! End to end tests for patch application on decoded app trees.
//!
//! Each test builds a small apktool-style directory in a temp dir, registers
//! patches, runs them through the driver and checks both the files on disk
//! and the recorded unified diff.

#[cfg(test)]
pub mod support;

#[cfg(test)]
mod manifests;
#[cfg(test)]
mod resources;
