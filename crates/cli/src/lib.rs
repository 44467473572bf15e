//! Command-line front end for applying patch manifests to decoded apps.

pub mod commands;
