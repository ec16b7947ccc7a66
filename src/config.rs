//! Construction parameters for [`BpTree`](crate::BpTree).

use crate::error::Result;
use crate::raw::Fanout;

/// Fanout used by [`TreeConfig::default`] and [`BpTree::default`](crate::BpTree::default).
pub const DEFAULT_FANOUT: usize = 16;

/// Parameters fixed for the lifetime of a tree.
///
/// # Examples
///
/// ```
/// use bptree_index::{BpTree, TreeConfig};
///
/// let config = TreeConfig::default().with_fanout(4);
/// let tree: BpTree<i32, String> = BpTree::with_config(config).unwrap();
/// assert_eq!(tree.fanout(), 4);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TreeConfig {
    /// Maximum number of keys per node. Must be at least 2.
    pub fanout: usize,
}

impl TreeConfig {
    /// Sets the maximum number of keys per node.
    #[must_use]
    pub const fn with_fanout(mut self, fanout: usize) -> Self {
        self.fanout = fanout;
        self
    }

    /// Checks the parameters without building a tree.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidFanout`](crate::TreeError::InvalidFanout) if `fanout < 2`.
    pub fn validate(&self) -> Result<()> {
        Fanout::new(self.fanout).map(|_| ())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            fanout: DEFAULT_FANOUT,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::TreeError;

    #[test]
    fn default_is_valid() {
        assert_eq!(TreeConfig::default().fanout, DEFAULT_FANOUT);
        assert!(TreeConfig::default().validate().is_ok());
    }

    #[test]
    fn small_fanout_is_rejected() {
        assert_eq!(TreeConfig::default().with_fanout(1).validate(), Err(TreeError::InvalidFanout(1)));
    }
}
