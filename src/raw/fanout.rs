use crate::error::{Result, TreeError};

/// The validated maximum number of keys a node may hold.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Fanout(usize);

impl Fanout {
    pub(crate) const MIN: usize = 2;

    pub(crate) const fn new(fanout: usize) -> Result<Self> {
        if fanout < Self::MIN {
            return Err(TreeError::InvalidFanout(fanout));
        }
        Ok(Self(fanout))
    }

    /// Keys a node holds before it is full.
    #[inline]
    pub(crate) const fn max_keys(self) -> usize {
        self.0
    }

    /// Keys every non-root interior node keeps after a removal: `ceil((fanout + 1) / 2) - 1`.
    #[inline]
    pub(crate) const fn min_keys(self) -> usize {
        (self.0 + 1).div_ceil(2) - 1
    }

    /// Keys every non-root leaf keeps after a removal: `(fanout + 1) / 2`, the smaller half of a
    /// leaf split. Never below [`Fanout::min_keys`].
    #[inline]
    pub(crate) const fn min_leaf_keys(self) -> usize {
        self.split_point()
    }

    /// Index at which an overflowing node of `fanout + 1` keys is divided.
    #[inline]
    pub(crate) const fn split_point(self) -> usize {
        (self.0 + 1) / 2
    }
}
