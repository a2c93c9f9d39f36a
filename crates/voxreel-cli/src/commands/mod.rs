//! Subcommand implementations

pub mod captions;
pub mod plan;
pub mod probe;
pub mod select;
