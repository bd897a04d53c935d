//! Subcommand implementations

pub mod benchmark;
pub mod init;
pub mod version;
