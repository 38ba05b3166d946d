use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::error::{Error, IoResultExt, Result};
use crate::object::{read_object, Object, ObjectKind};
use crate::repo::Repository;
use crate::resolve::find_object;
use crate::types::Tree;

/// materialize a tree-ish into an empty directory
///
/// `name` may be a commit, an annotated tag, or a tree; type-following
/// descends to the tree either way
pub fn checkout(repo: &Repository, name: &str, target: &Path) -> Result<()> {
    let tree_id = find_object(repo, name, Some(ObjectKind::Tree), true)?;
    let tree = crate::object::read_tree(repo, &tree_id)?;

    if target.exists() {
        if !target.is_dir() {
            return Err(Error::NotADirectory(target.to_path_buf()));
        }
        if target.read_dir().with_path(target)?.next().is_some() {
            return Err(Error::NotEmpty(target.to_path_buf()));
        }
    } else {
        fs::create_dir_all(target).with_path(target)?;
    }

    checkout_tree(repo, &tree, target)
}

fn checkout_tree(repo: &Repository, tree: &Tree, target: &Path) -> Result<()> {
    for entry in tree.entries() {
        let dest = target.join(OsStr::from_bytes(&entry.name));

        match read_object(repo, &entry.id)? {
            Object::Tree(subtree) => {
                fs::create_dir(&dest).with_path(&dest)?;
                checkout_tree(repo, &subtree, &dest)?;
            }
            Object::Blob(data) => {
                fs::write(&dest, &data).with_path(&dest)?;
                if entry.mode == b"100755" {
                    fs::set_permissions(&dest, fs::Permissions::from_mode(0o755))
                        .with_path(&dest)?;
                }
            }
            other => {
                // commits (gitlinks) and tags cannot be materialized
                return Err(Error::TypeMismatch {
                    id: entry.id,
                    expected: ObjectKind::Blob,
                    actual: other.kind(),
                });
            }
        }
    }
    Ok(())
}
