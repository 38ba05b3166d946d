//! high-level operations over a repository handle

mod add;
mod checkout;
mod commit;
mod log;
mod ls_tree;
mod tag;

pub use add::{add, add_all};
pub use checkout::checkout;
pub use commit::{commit, write_tree};
pub use log::log_edges;
pub use ls_tree::{ls_tree, LsTreeEntry};
pub use tag::{tag_create, tag_list};
