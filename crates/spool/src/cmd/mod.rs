//! Subcommands

pub mod check;
pub mod envelope;
pub mod ingest;
