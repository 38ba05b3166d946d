use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::NamedTempFile;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::{self, ObjectId};
use crate::repo::Repository;
use crate::types::{Commit, Tag, Tree};

/// the four stored object kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            "tag" => Ok(ObjectKind::Tag),
            other => Err(Error::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// a decoded object: one tagged sum instead of a class hierarchy
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Commit(_) => ObjectKind::Commit,
            Object::Tag(_) => ObjectKind::Tag,
        }
    }

    /// payload bytes as stored after the header
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Object::Blob(data) => data.clone(),
            Object::Tree(tree) => tree.serialize(),
            Object::Commit(commit) => commit.serialize(),
            Object::Tag(tag) => tag.serialize(),
        }
    }

    /// decode a payload of the given kind
    pub fn parse(kind: ObjectKind, payload: Vec<u8>) -> Result<Self> {
        Ok(match kind {
            ObjectKind::Blob => Object::Blob(payload),
            ObjectKind::Tree => Object::Tree(Tree::parse(&payload)?),
            ObjectKind::Commit => Object::Commit(Commit::parse(&payload)?),
            ObjectKind::Tag => Object::Tag(Tag::parse(&payload)?),
        })
    }
}

/// full serialization: `<kind> SP <decimal size> NUL <payload>`
fn encode(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(payload.len() + 16);
    raw.extend_from_slice(kind.as_str().as_bytes());
    raw.push(b' ');
    raw.extend_from_slice(payload.len().to_string().as_bytes());
    raw.push(0);
    raw.extend_from_slice(payload);
    raw
}

/// id an object of this kind and payload would get, without touching the store
pub fn hash_object(kind: ObjectKind, payload: &[u8]) -> ObjectId {
    hash::digest(&encode(kind, payload))
}

/// on-disk location of an object
pub fn object_path(repo: &Repository, id: &ObjectId) -> PathBuf {
    let (dir, file) = id.to_path_components();
    repo.git_path(Path::new("objects").join(dir).join(file))
}

/// hash, deflate and store an object; idempotent for existing content
pub fn write_object(repo: &Repository, object: &Object) -> Result<ObjectId> {
    let raw = encode(object.kind(), &object.serialize());
    let id = hash::digest(&raw);

    let path = object_path(repo, &id);
    if path.exists() {
        // content-addressed: the same bytes are already stored
        return Ok(id);
    }

    let parent = path
        .parent()
        .ok_or_else(|| Error::Malformed(format!("object path without parent: {}", id)))?;
    fs::create_dir_all(parent).with_path(parent)?;

    let compressed = hash::compress(&raw)?;
    let mut tmp = NamedTempFile::new_in(repo.gitdir()).with_path(repo.gitdir())?;
    tmp.write_all(&compressed).with_path(&path)?;
    tmp.persist(&path).map_err(|e| Error::Io {
        path: path.clone(),
        source: e.error,
    })?;

    log::debug!("wrote {} object {}", object.kind(), id);
    Ok(id)
}

fn read_raw(repo: &Repository, id: &ObjectId) -> Result<Vec<u8>> {
    let path = object_path(repo, id);
    let compressed = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ObjectNotFound(*id)
        } else {
            Error::Io { path, source: e }
        }
    })?;
    hash::decompress(&compressed)
}

fn header_kind(raw: &[u8], id: &ObjectId) -> Result<(ObjectKind, usize)> {
    let sp = raw
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| Error::Malformed(format!("object {}: missing header", id)))?;
    let word = std::str::from_utf8(&raw[..sp])
        .map_err(|_| Error::Malformed(format!("object {}: non-ascii header", id)))?;
    Ok((word.parse()?, sp))
}

/// inflate and decode an object, validating the declared size
pub fn read_object(repo: &Repository, id: &ObjectId) -> Result<Object> {
    let raw = read_raw(repo, id)?;
    let (kind, sp) = header_kind(&raw, id)?;

    let nul = raw[sp..]
        .iter()
        .position(|&b| b == 0)
        .map(|i| i + sp)
        .ok_or_else(|| Error::Malformed(format!("object {}: unterminated header", id)))?;
    let size: usize = std::str::from_utf8(&raw[sp + 1..nul])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::Malformed(format!("object {}: bad size field", id)))?;

    let payload = &raw[nul + 1..];
    if size != payload.len() {
        return Err(Error::Malformed(format!(
            "object {}: declared size {} but payload is {} bytes",
            id,
            size,
            payload.len()
        )));
    }

    Object::parse(kind, payload.to_vec())
}

/// kind of a stored object, reading only the header word
pub fn object_kind(repo: &Repository, id: &ObjectId) -> Result<ObjectKind> {
    let raw = read_raw(repo, id)?;
    Ok(header_kind(&raw, id)?.0)
}

/// read an object required to be a blob
pub fn read_blob(repo: &Repository, id: &ObjectId) -> Result<Vec<u8>> {
    match read_object(repo, id)? {
        Object::Blob(data) => Ok(data),
        other => Err(mismatch(id, ObjectKind::Blob, &other)),
    }
}

/// read an object required to be a tree
pub fn read_tree(repo: &Repository, id: &ObjectId) -> Result<Tree> {
    match read_object(repo, id)? {
        Object::Tree(tree) => Ok(tree),
        other => Err(mismatch(id, ObjectKind::Tree, &other)),
    }
}

/// read an object required to be a commit
pub fn read_commit(repo: &Repository, id: &ObjectId) -> Result<Commit> {
    match read_object(repo, id)? {
        Object::Commit(commit) => Ok(commit),
        other => Err(mismatch(id, ObjectKind::Commit, &other)),
    }
}

/// read an object required to be a tag
pub fn read_tag(repo: &Repository, id: &ObjectId) -> Result<Tag> {
    match read_object(repo, id)? {
        Object::Tag(tag) => Ok(tag),
        other => Err(mismatch(id, ObjectKind::Tag, &other)),
    }
}

fn mismatch(id: &ObjectId, expected: ObjectKind, got: &Object) -> Error {
    Error::TypeMismatch {
        id: *id,
        expected,
        actual: got.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Kvlm, TreeEntry};
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo = Repository::init(&dir.path().join("repo")).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_blob_known_vector() {
        // `echo hello | git hash-object --stdin`
        let id = hash_object(ObjectKind::Blob, b"hello\n");
        assert_eq!(id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn test_write_and_read_blob() {
        let (_dir, repo) = test_repo();

        let id = write_object(&repo, &Object::Blob(b"hello\n".to_vec())).unwrap();
        assert_eq!(id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
        assert!(object_path(&repo, &id).is_file());

        assert_eq!(read_blob(&repo, &id).unwrap(), b"hello\n");
    }

    #[test]
    fn test_write_is_idempotent() {
        let (_dir, repo) = test_repo();

        let id1 = write_object(&repo, &Object::Blob(b"same".to_vec())).unwrap();
        let id2 = write_object(&repo, &Object::Blob(b"same".to_vec())).unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_roundtrip_all_kinds() {
        let (_dir, repo) = test_repo();

        let blob = Object::Blob(b"payload".to_vec());

        let tree = Object::Tree(Tree::from_entries(vec![TreeEntry::new(
            "100644",
            "hello.txt",
            ObjectId::from_hex("ce013625030ba8dba906f756967f9e9ca394464a").unwrap(),
        )]));

        let mut kvlm = Kvlm::new();
        kvlm.push("tree", "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        kvlm.push("author", "Alice <alice@example.com> 1527025023 +0200");
        kvlm.push("committer", "Alice <alice@example.com> 1527025023 +0200");
        kvlm.set_message("first\n");
        let commit = Object::Commit(Commit::from_kvlm(kvlm));

        let mut kvlm = Kvlm::new();
        kvlm.push("object", "ce013625030ba8dba906f756967f9e9ca394464a");
        kvlm.push("type", "blob");
        kvlm.push("tag", "v0");
        kvlm.push("tagger", "Alice <alice@example.com> 1527025023 +0200");
        kvlm.set_message("tagged\n");
        let tag = Object::Tag(Tag::from_kvlm(kvlm));

        for object in [blob, tree, commit, tag] {
            let id = write_object(&repo, &object).unwrap();
            let read_back = read_object(&repo, &id).unwrap();
            assert_eq!(read_back, object);
            assert_eq!(object_kind(&repo, &id).unwrap(), object.kind());
        }
    }

    #[test]
    fn test_hash_object_does_not_write() {
        let (_dir, repo) = test_repo();
        let id = hash_object(ObjectKind::Blob, b"never stored");
        assert!(!object_path(&repo, &id).exists());
    }

    #[test]
    fn test_read_missing_object() {
        let (_dir, repo) = test_repo();
        let id = ObjectId::from_hex("ce013625030ba8dba906f756967f9e9ca394464a").unwrap();
        assert!(matches!(
            read_object(&repo, &id),
            Err(Error::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let (_dir, repo) = test_repo();

        // declared size one byte short of the payload
        let raw = b"blob 4\0hello";
        let id = hash::digest(raw);
        let path = object_path(&repo, &id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, hash::compress(raw).unwrap()).unwrap();

        assert!(matches!(read_object(&repo, &id), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let (_dir, repo) = test_repo();

        let raw = b"sprocket 4\0spin";
        let id = hash::digest(raw);
        let path = object_path(&repo, &id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, hash::compress(raw).unwrap()).unwrap();

        assert!(matches!(
            read_object(&repo, &id),
            Err(Error::UnknownKind(_))
        ));
    }

    #[test]
    fn test_typed_reader_mismatch() {
        let (_dir, repo) = test_repo();

        let id = write_object(&repo, &Object::Blob(b"not a tree".to_vec())).unwrap();
        let err = read_tree(&repo, &id).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: ObjectKind::Tree,
                actual: ObjectKind::Blob,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_tree_known_vector() {
        let (_dir, repo) = test_repo();
        let id = write_object(&repo, &Object::Tree(Tree::new())).unwrap();
        assert_eq!(id.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }
}
