mod arena;
mod handle;
mod node;
mod raw_osbtree_list;

pub(crate) use handle::Handle;
pub(crate) use node::Node;
pub(crate) use raw_osbtree_list::RawOSBTreeList;
