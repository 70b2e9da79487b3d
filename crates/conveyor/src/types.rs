//! Shared type definitions for the conveyor crate
//!
//! This module contains common types that are used across multiple components
//! of the bundler, ensuring consistency and avoiding circular dependencies.

/// Classification of a directive reference based on how it is resolved
///
/// A reference in a manifest is either a logical name looked up through the
/// configured load paths, or a path resolved relative to the requiring asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// Bare name searched through the load paths in declared order
    /// (e.g., `codemirror`, `jquery.fileupload`)
    Logical,

    /// Path starting with `./` or `../`, resolved against the directory of
    /// the requiring asset
    Relative,
}

impl RefKind {
    /// Check if this reference is resolved through the load paths
    pub fn is_logical(&self) -> bool {
        matches!(self, RefKind::Logical)
    }

    /// Check if this reference is resolved relative to the requiring asset
    pub fn is_relative(&self) -> bool {
        matches!(self, RefKind::Relative)
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefKind::Logical => write!(f, "logical"),
            RefKind::Relative => write!(f, "relative"),
        }
    }
}
