use std::fs;

use chrono::Local;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::ObjectId;
use crate::index::read_index;
use crate::object::{write_object, Object};
use crate::refs;
use crate::repo::Repository;
use crate::types::{Commit, Kvlm, Tree, TreeEntry};

/// hash the current index as a single flat tree
///
/// the index must hold only top-level paths; building nested trees from
/// directory prefixes is out of scope
pub fn write_tree(repo: &Repository) -> Result<ObjectId> {
    let entries = read_index(repo)?;

    let mut tree = Tree::new();
    for entry in &entries {
        if entry.path.contains('/') {
            return Err(Error::NestedPath(entry.path.clone()));
        }
        tree.push(TreeEntry::new(
            format!("{:o}", entry.mode),
            entry.path.as_bytes(),
            entry.id,
        ));
    }
    write_object(repo, &Object::Tree(tree))
}

/// record the staged tree as a commit and advance the current branch
///
/// HEAD is resolved one level to find the branch ref that supplies the
/// parent and receives the new hash; a detached HEAD is updated directly
pub fn commit(
    repo: &Repository,
    author: &str,
    committer: &str,
    message: &str,
) -> Result<ObjectId> {
    if read_index(repo)?.is_empty() {
        return Err(Error::NothingToCommit);
    }

    let branch = head_target(repo)?;
    let parent = if refs::ref_exists(repo, &branch) {
        Some(refs::ref_resolve(repo, &branch)?)
    } else {
        None
    };

    let tree = write_tree(repo)?;
    let timestamp = author_timestamp();

    let mut kvlm = Kvlm::new();
    kvlm.push("tree", tree.to_hex());
    if let Some(parent) = parent {
        kvlm.push("parent", parent.to_hex());
    }
    kvlm.push("author", format!("{} {}", author, timestamp));
    kvlm.push("committer", format!("{} {}", committer, timestamp));
    kvlm.set_message(format!("{}\n", message));

    let id = write_object(repo, &Object::Commit(Commit::from_kvlm(kvlm)))?;
    refs::ref_create(repo, &branch, &id)?;
    log::debug!("advanced {} to {}", branch, id);
    Ok(id)
}

/// the gitdir-relative ref HEAD points at, or HEAD itself when detached
fn head_target(repo: &Repository) -> Result<String> {
    let path = repo.git_path("HEAD");
    let data = fs::read_to_string(&path).with_path(&path)?;
    Ok(match data.trim().strip_prefix("ref: ") {
        Some(target) => target.trim().to_string(),
        None => "HEAD".to_string(),
    })
}

/// unix seconds and local `+HHMM`/`-HHMM` offset, as commit headers record it
pub(crate) fn author_timestamp() -> String {
    let now = Local::now();
    let offset_seconds = now.offset().local_minus_utc();
    let hours = offset_seconds / 3600;
    let minutes = offset_seconds.abs() % 3600 / 60;
    format!("{} {:+03}{:02}", now.timestamp(), hours, minutes)
}
