//! grit - git-compatible content-addressed revision store
//!
//! manages a working directory together with a `.git` metadata directory
//! holding an object database, a ref namespace, a binary staging index and
//! an INI-shaped config, all at the on-disk level git itself uses.
//!
//! # Core concepts
//!
//! - **Object**: an immutable record stored zlib-deflated under
//!   `objects/<aa>/<38 hex>`, named by the SHA-1 of
//!   `<kind> SP <size> NUL <payload>`. Four kinds: blob, tree, commit, tag.
//! - **Ref**: a file whose content is either a hex hash or `ref: <path>`;
//!   `HEAD` is the symbolic ref naming the current branch.
//! - **Index**: the `DIRC` v2 staging snapshot with a SHA-1 trailer,
//!   rewritten wholesale so the reference tool can read it back.
//!
//! # Example usage
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use grit::{ops, Repository};
//!
//! let repo = Repository::init(Path::new("/path/to/repo")).unwrap();
//! ops::add(&repo, &[PathBuf::from("hello.txt")]).unwrap();
//! let id = ops::commit(&repo, "A <a@x>", "A <a@x>", "first commit").unwrap();
//! println!("{}", id);
//! ```

mod config;
mod error;
mod hash;
mod index;
mod object;
mod refs;
mod repo;
mod resolve;

pub mod ops;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use hash::ObjectId;
pub use index::{read_index, write_index, IndexEntry};
pub use object::{
    hash_object, object_kind, read_blob, read_commit, read_object, read_tag, read_tree,
    write_object, Object, ObjectKind,
};
pub use refs::{flatten_refs, list_refs, ref_create, ref_exists, ref_resolve, RefMap, RefValue};
pub use repo::Repository;
pub use resolve::{find_object, resolve_name};
