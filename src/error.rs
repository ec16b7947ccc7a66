//! Error types for [`BpTree`](crate::BpTree).

use thiserror::Error;

/// Convenient alias for results produced by the tree.
pub type Result<T> = core::result::Result<T, TreeError>;

/// Why a tree operation did not take effect.
///
/// None of these are fatal: the tree is left exactly as it was and stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The key is already present; the stored value was not replaced.
    #[error("key is already present in the tree")]
    DuplicateKey,

    /// The key is not present in a non-empty tree.
    #[error("key not found")]
    KeyNotFound,

    /// The tree has no root.
    #[error("tree is empty")]
    EmptyTree,

    /// A node must be able to hold at least two keys.
    #[error("fanout must be at least 2, got {0}")]
    InvalidFanout(usize),
}

impl TreeError {
    /// True for the lookup failures, which callers usually treat alike.
    #[must_use]
    pub const fn is_not_found(self) -> bool {
        matches!(self, TreeError::KeyNotFound | TreeError::EmptyTree)
    }
}
