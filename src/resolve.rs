use std::fs;
use std::path::Path;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::ObjectId;
use crate::object::{self, ObjectKind};
use crate::refs;
use crate::repo::Repository;

/// resolve a user-supplied name to candidate object hashes
///
/// a name can be `HEAD`, a full or short (>= 4 hex chars) hash, a branch,
/// a tag, or any gitdir-relative ref path; several rules can match at once
pub fn resolve_name(repo: &Repository, name: &str) -> Result<Vec<String>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(Vec::new());
    }

    if name == "HEAD" {
        return Ok(vec![refs::ref_resolve(repo, "HEAD")?.to_hex()]);
    }

    let is_hex = name.chars().all(|c| c.is_ascii_hexdigit());
    if is_hex && name.len() == 40 {
        return Ok(vec![name.to_ascii_lowercase()]);
    }

    let mut candidates = Vec::new();

    if is_hex && (4..40).contains(&name.len()) {
        let short = name.to_ascii_lowercase();
        let (prefix, rest) = short.split_at(2);
        let dir = repo.git_path(Path::new("objects").join(prefix));
        if dir.is_dir() {
            for entry in fs::read_dir(&dir).with_path(&dir)? {
                let entry = entry.with_path(&dir)?;
                let tail = entry.file_name().to_string_lossy().into_owned();
                if tail.starts_with(rest) {
                    candidates.push(format!("{}{}", prefix, tail));
                }
            }
        }
    }

    for rel in [
        format!("refs/heads/{}", name),
        format!("refs/tags/{}", name),
        format!("refs/{}", name),
        name.to_string(),
    ] {
        if refs::ref_exists(repo, &rel) {
            candidates.push(refs::ref_resolve(repo, &rel)?.to_hex());
        }
    }

    Ok(candidates)
}

/// resolve a name to exactly one object, optionally requiring a kind
///
/// with `follow`, an annotated tag descends into its `object` and a commit
/// descends into its `tree` when a tree was asked for
pub fn find_object(
    repo: &Repository,
    name: &str,
    kind: Option<ObjectKind>,
    follow: bool,
) -> Result<ObjectId> {
    let candidates = resolve_name(repo, name)?;
    if candidates.is_empty() {
        return Err(Error::NoSuchReference(name.to_string()));
    }
    if candidates.len() > 1 {
        return Err(Error::Ambiguous {
            name: name.to_string(),
            candidates,
        });
    }

    let mut id = ObjectId::from_hex(&candidates[0])?;
    let Some(want) = kind else {
        return Ok(id);
    };

    loop {
        let actual = object::object_kind(repo, &id)?;
        if actual == want {
            return Ok(id);
        }
        if !follow {
            return Err(Error::TypeMismatch {
                id,
                expected: want,
                actual,
            });
        }
        match actual {
            ObjectKind::Tag => id = object::read_tag(repo, &id)?.object()?,
            ObjectKind::Commit if want == ObjectKind::Tree => {
                id = object::read_commit(repo, &id)?.tree()?
            }
            _ => {
                return Err(Error::TypeMismatch {
                    id,
                    expected: want,
                    actual,
                })
            }
        }
    }
}
