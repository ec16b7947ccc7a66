//! An in-memory B+Tree index with a configurable fanout.
//!
//! [`BpTree`] maps unique, ordered keys to values. All entries live in the leaves, which are
//! chained left to right so ordered traversal is a linear walk. Interior nodes hold only
//! separator keys, and every separator equals the least key of the subtree to its right.
//!
//! # Example
//!
//! ```
//! use bptree_index::BpTree;
//!
//! let mut index = BpTree::new(3);
//! for key in [5, 1, 4, 2, 3] {
//!     index.insert(key, key * 100);
//! }
//!
//! assert_eq!(index.find(&4), Some(&400));
//! assert_eq!(index.ordered_values(), [100, 200, 300, 400, 500]);
//!
//! // Duplicate keys are rejected rather than overwritten.
//! assert!(!index.insert(4, 0));
//!
//! // Removal rebalances by borrowing from or merging with a sibling.
//! assert!(index.remove(&1));
//! assert!(index.remove(&2));
//! assert_eq!(index.keys().copied().collect::<Vec<_>>(), [3, 4, 5]);
//! ```
//!
//! # Shape
//!
//! With fanout `f`, every node holds at most `f` keys. A non-root leaf keeps at least
//! `(f + 1) / 2` keys, the smaller half of a leaf split, and a non-root interior node at least
//! `ceil((f + 1) / 2) - 1`. An insert into a full leaf splits it and pushes the new sibling's
//! least key into the parent, splitting upward as needed. A removal that leaves a node below
//! the minimum borrows from an adjacent sibling when one can spare an entry, and otherwise
//! coalesces with one; the root collapses when it is left with a single child.
//!
//! # Logging
//!
//! Structural changes are reported through [`tracing`]: inserts at `TRACE`, splits, borrows,
//! coalesces and root changes at `DEBUG`. No subscriber is installed by this crate.

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod raw;

pub mod bptree;
pub mod config;
pub mod error;

pub use bptree::BpTree;
pub use config::{DEFAULT_FANOUT, TreeConfig};
pub use error::{Result, TreeError};
