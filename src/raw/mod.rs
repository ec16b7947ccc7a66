mod arena;
mod fanout;
mod handle;
mod node;
mod raw_bptree;
mod rebalance;
mod split;

pub(crate) use fanout::Fanout;
pub(crate) use handle::Handle;
pub(crate) use raw_bptree::RawBpTree;
