//! wire codecs and in-memory forms of the stored object payloads

mod commit;
mod kvlm;
mod tree;

pub use commit::{Commit, Tag};
pub use kvlm::Kvlm;
pub use tree::{Tree, TreeEntry};
