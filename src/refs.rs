use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::ObjectId;
use crate::repo::Repository;

/// how many levels of `ref: ` indirection to follow before giving up
const MAX_SYMREF_DEPTH: usize = 16;

/// nested listing of a ref namespace: directories become nested maps,
/// files resolve to their target hashes
pub type RefMap = BTreeMap<String, RefValue>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefValue {
    Direct(ObjectId),
    Dir(RefMap),
}

/// create or overwrite a ref file under the gitdir
pub fn ref_create(repo: &Repository, name: &str, id: &ObjectId) -> Result<()> {
    validate_ref_name(name)?;
    repo.write_gitfile(name, format!("{}\n", id.to_hex()).as_bytes())
}

/// follow a ref (gitdir-relative path) to the hash it ultimately names
///
/// symbolic refs (`ref: <path>`) are chased with a bounded iteration count;
/// exhausting it means the chain loops
pub fn ref_resolve(repo: &Repository, name: &str) -> Result<ObjectId> {
    let mut current = name.to_string();
    for _ in 0..MAX_SYMREF_DEPTH {
        let path = repo.git_path(&current);
        let data = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NoSuchReference(current.clone())
            } else {
                Error::Io { path, source: e }
            }
        })?;

        match data.trim_end_matches('\n').strip_prefix("ref: ") {
            Some(target) => current = target.trim().to_string(),
            None => return ObjectId::from_hex(data.trim()),
        }
    }
    Err(Error::RefCycle(name.to_string()))
}

/// whether a ref file exists, without resolving it
pub fn ref_exists(repo: &Repository, name: &str) -> bool {
    repo.git_path(name).is_file()
}

/// recursively list a ref namespace (default `refs`), fully resolved
pub fn list_refs(repo: &Repository, subpath: Option<&str>) -> Result<RefMap> {
    let rel = subpath.unwrap_or("refs");
    collect(repo, rel, &repo.git_path(rel))
}

fn collect(repo: &Repository, rel: &str, dir: &Path) -> Result<RefMap> {
    let mut map = RefMap::new();
    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let child_rel = format!("{}/{}", rel, name);

        if entry.path().is_dir() {
            map.insert(name, RefValue::Dir(collect(repo, &child_rel, &entry.path())?));
        } else {
            map.insert(name, RefValue::Direct(ref_resolve(repo, &child_rel)?));
        }
    }
    Ok(map)
}

/// flatten a listing into `(full name, hash)` pairs in sorted order
pub fn flatten_refs(map: &RefMap, prefix: &str) -> Vec<(String, ObjectId)> {
    let mut out = Vec::new();
    for (name, value) in map {
        let full = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };
        match value {
            RefValue::Direct(id) => out.push((full, *id)),
            RefValue::Dir(nested) => out.extend(flatten_refs(nested, &full)),
        }
    }
    out
}

fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidRef("empty ref name".to_string()));
    }
    if name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        return Err(Error::InvalidRef(name.to_string()));
    }
    if name.contains('\0') {
        return Err(Error::InvalidRef(name.to_string()));
    }
    for component in name.split('/') {
        if component == "." || component == ".." {
            return Err(Error::InvalidRef(name.to_string()));
        }
    }
    Ok(())
}
