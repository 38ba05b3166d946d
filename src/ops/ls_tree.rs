use crate::error::Result;
use crate::hash::ObjectId;
use crate::object::{object_kind, read_tree, ObjectKind};
use crate::repo::Repository;
use crate::resolve::find_object;

/// one tree listing row: `<mode> <kind> <sha>\t<name>`
#[derive(Debug, Clone)]
pub struct LsTreeEntry {
    pub mode: String,
    pub kind: ObjectKind,
    pub id: ObjectId,
    pub name: String,
}

impl std::fmt::Display for LsTreeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // modes are stored with 5 or 6 digits; print them 6 wide
        write!(f, "{:0>6} {} {}\t{}", self.mode, self.kind, self.id, self.name)
    }
}

/// list the entries of a tree-ish, in stored order
pub fn ls_tree(repo: &Repository, name: &str) -> Result<Vec<LsTreeEntry>> {
    let tree_id = find_object(repo, name, Some(ObjectKind::Tree), true)?;
    let tree = read_tree(repo, &tree_id)?;

    tree.entries()
        .iter()
        .map(|entry| {
            Ok(LsTreeEntry {
                mode: entry.mode_lossy(),
                kind: object_kind(repo, &entry.id)?,
                id: entry.id,
                name: entry.name_lossy(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{write_object, Object};
    use crate::ops::{add, commit};
    use crate::types::{Tree, TreeEntry};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo = Repository::init(&dir.path().join("repo")).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_ls_tree_of_head() {
        let (_dir, repo) = test_repo();
        fs::write(repo.worktree().join("hello.txt"), "hello\n").unwrap();
        add(&repo, &[PathBuf::from("hello.txt")]).unwrap();
        commit(&repo, "A <a@x>", "A <a@x>", "first").unwrap();

        let entries = ls_tree(&repo, "HEAD").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "hello.txt");
        assert_eq!(entries[0].kind, ObjectKind::Blob);
        assert_eq!(
            entries[0].id.to_hex(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    #[test]
    fn test_display_pads_directory_mode() {
        let (_dir, repo) = test_repo();

        let blob = write_object(&repo, &Object::Blob(b"x".to_vec())).unwrap();
        let inner = write_object(
            &repo,
            &Object::Tree(Tree::from_entries(vec![TreeEntry::new(
                "100644", "f", blob,
            )])),
        )
        .unwrap();
        let root = write_object(
            &repo,
            &Object::Tree(Tree::from_entries(vec![TreeEntry::new(
                "40000", "sub", inner,
            )])),
        )
        .unwrap();

        let entries = ls_tree(&repo, &root.to_hex()).unwrap();
        let line = entries[0].to_string();
        assert!(line.starts_with("040000 tree "));
        assert!(line.ends_with("\tsub"));
    }
}
