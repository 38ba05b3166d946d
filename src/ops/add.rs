use std::collections::HashSet;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::index::{read_index, write_index, IndexEntry};
use crate::object::{write_object, Object};
use crate::repo::Repository;

/// stage worktree-relative paths into the index
///
/// directories expand recursively, skipping subpaths whose top-level
/// component begins with `.` (which keeps `.git` out); paths staged again
/// replace their previous entries
pub fn add(repo: &Repository, paths: &[PathBuf]) -> Result<()> {
    let mut files = Vec::new();
    for path in paths {
        let abs = repo.worktree().join(path);
        if abs.is_dir() {
            collect_files(repo, path, &mut files)?;
        } else {
            files.push(path.clone());
        }
    }

    let mut entries = read_index(repo)?;
    let staged: HashSet<String> = files
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    entries.retain(|e| !staged.contains(&e.path));

    for file in &files {
        entries.push(stage_file(repo, file)?);
    }
    write_index(repo, &mut entries)
}

/// stage every file under the worktree
pub fn add_all(repo: &Repository) -> Result<()> {
    add(repo, &[PathBuf::new()])
}

fn collect_files(repo: &Repository, rel: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if let Some(name) = rel.file_name() {
        if name.to_string_lossy().starts_with('.') {
            log::debug!("not staging hidden directory {}", rel.display());
            return Ok(());
        }
    }

    let root = repo.worktree().join(rel);
    let walker = WalkDir::new(&root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() != 1 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(|e| Error::Io {
            path: root.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(path) = entry.path().strip_prefix(repo.worktree()) {
            out.push(path.to_path_buf());
        }
    }
    Ok(())
}

/// hash one file into the object store and build its index entry
fn stage_file(repo: &Repository, rel: &Path) -> Result<IndexEntry> {
    let abs = repo.worktree().join(rel);
    let content = fs::read(&abs).with_path(&abs)?;
    let id = write_object(repo, &Object::Blob(content))?;

    let path = rel.to_string_lossy().into_owned();
    if path.len() >= 1 << 12 {
        return Err(Error::PathTooLong(path));
    }

    let meta = fs::metadata(&abs).with_path(&abs)?;
    Ok(IndexEntry {
        ctime_s: meta.ctime() as u32,
        ctime_n: (meta.ctime_nsec() % 1_000_000_000) as u32,
        mtime_s: meta.mtime() as u32,
        mtime_n: (meta.mtime_nsec() % 1_000_000_000) as u32,
        dev: meta.dev() as u32,
        ino: meta.ino() as u32,
        mode: index_mode(meta.mode()),
        uid: meta.uid(),
        gid: meta.gid(),
        size: meta.size() as u32,
        id,
        flags: path.len() as u16,
        path,
    })
}

/// squash a stat mode to what the index stores: symlinks keep their type
/// bits, everything else becomes a regular file at 0644 or 0755
fn index_mode(mode: u32) -> u32 {
    const S_IFMT: u32 = 0o170000;
    const S_IFLNK: u32 = 0o120000;
    if mode & S_IFMT == S_IFLNK {
        return S_IFLNK;
    }
    if mode & 0o100 != 0 {
        0o100755
    } else {
        0o100644
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{object_kind, ObjectKind};
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo = Repository::init(&dir.path().join("repo")).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_stage_single_file() {
        let (_dir, repo) = test_repo();
        fs::write(repo.worktree().join("hello.txt"), "hello\n").unwrap();

        add(&repo, &[PathBuf::from("hello.txt")]).unwrap();

        let entries = read_index(&repo).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.path, "hello.txt");
        assert_eq!(entry.id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
        assert_eq!(entry.size, 6);
        assert_eq!(entry.flags, 9);
        assert_eq!(entry.stage(), 0);
        assert_eq!(entry.mode, 0o100644);

        // the blob landed in the object store
        assert_eq!(object_kind(&repo, &entry.id).unwrap(), ObjectKind::Blob);
    }

    #[test]
    fn test_restaging_replaces_entry() {
        let (_dir, repo) = test_repo();
        let file = repo.worktree().join("hello.txt");

        fs::write(&file, "hello\n").unwrap();
        add(&repo, &[PathBuf::from("hello.txt")]).unwrap();

        fs::write(&file, "changed\n").unwrap();
        add(&repo, &[PathBuf::from("hello.txt")]).unwrap();

        let entries = read_index(&repo).unwrap();
        assert_eq!(entries.len(), 1);
        assert_ne!(
            entries[0].id.to_hex(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    #[test]
    fn test_stage_directory_recursively() {
        let (_dir, repo) = test_repo();
        let src = repo.worktree().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.rs"), "a").unwrap();
        fs::write(src.join("nested/b.rs"), "b").unwrap();

        add(&repo, &[PathBuf::from("src")]).unwrap();

        let entries = read_index(&repo).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["src/a.rs", "src/nested/b.rs"]);
    }

    #[test]
    fn test_add_all_skips_dot_entries() {
        let (_dir, repo) = test_repo();
        fs::write(repo.worktree().join("visible.txt"), "v").unwrap();
        fs::create_dir(repo.worktree().join(".secrets")).unwrap();
        fs::write(repo.worktree().join(".secrets/key"), "k").unwrap();

        add_all(&repo).unwrap();

        let entries = read_index(&repo).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        // .git and .secrets are both pruned at the top level
        assert_eq!(paths, ["visible.txt"]);
    }

    #[test]
    fn test_executable_file_mode() {
        let (_dir, repo) = test_repo();
        let file = repo.worktree().join("run.sh");
        fs::write(&file, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o755)).unwrap();

        add(&repo, &[PathBuf::from("run.sh")]).unwrap();

        let entries = read_index(&repo).unwrap();
        assert_eq!(entries[0].mode, 0o100755);
        assert_eq!(entries[0].mode_type(), 0b1000);
        assert_eq!(entries[0].mode_perms(), 0o755);
    }

    #[test]
    fn test_index_is_sorted_across_adds() {
        let (_dir, repo) = test_repo();
        fs::write(repo.worktree().join("zebra"), "z").unwrap();
        fs::write(repo.worktree().join("alpha"), "a").unwrap();

        add(&repo, &[PathBuf::from("zebra")]).unwrap();
        add(&repo, &[PathBuf::from("alpha")]).unwrap();

        let entries = read_index(&repo).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["alpha", "zebra"]);
    }
}
