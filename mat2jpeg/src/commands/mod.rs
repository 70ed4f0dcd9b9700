//! Subcommand implementations, selected by mode flags.

pub mod convert;
pub mod list;
pub mod validate;
