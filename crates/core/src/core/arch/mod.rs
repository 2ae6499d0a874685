//! Architectural state of the core.

/// Integer register file with renaming tags.
pub mod regfile;

pub use regfile::RegisterFile;
