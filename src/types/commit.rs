use crate::error::{Error, Result};
use crate::hash::ObjectId;
use crate::types::Kvlm;

/// commit object: a kvlm with `tree`, optional `parent`s, `author`,
/// `committer` headers and a message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    kvlm: Kvlm,
}

impl Commit {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Ok(Self {
            kvlm: Kvlm::parse(raw)?,
        })
    }

    pub fn from_kvlm(kvlm: Kvlm) -> Self {
        Self { kvlm }
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.kvlm.serialize()
    }

    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    /// the root tree this commit snapshots
    pub fn tree(&self) -> Result<ObjectId> {
        id_field(&self.kvlm, b"tree")
    }

    /// parent commits, in header order; empty for the initial commit
    pub fn parents(&self) -> Result<Vec<ObjectId>> {
        self.kvlm
            .values(b"parent")
            .into_iter()
            .map(hex_id)
            .collect()
    }

    pub fn author(&self) -> Option<String> {
        self.kvlm
            .first(b"author")
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }

    pub fn message(&self) -> &[u8] {
        self.kvlm.message()
    }
}

/// annotated tag object: structurally the same kvlm shape as a commit,
/// with `object`, `type`, `tag` and `tagger` headers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    kvlm: Kvlm,
}

impl Tag {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Ok(Self {
            kvlm: Kvlm::parse(raw)?,
        })
    }

    pub fn from_kvlm(kvlm: Kvlm) -> Self {
        Self { kvlm }
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.kvlm.serialize()
    }

    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    /// the object this tag points at
    pub fn object(&self) -> Result<ObjectId> {
        id_field(&self.kvlm, b"object")
    }

    /// declared kind of the tagged object
    pub fn target_kind(&self) -> Option<String> {
        self.kvlm
            .first(b"type")
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }

    pub fn name(&self) -> Option<String> {
        self.kvlm
            .first(b"tag")
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }

    pub fn message(&self) -> &[u8] {
        self.kvlm.message()
    }
}

fn id_field(kvlm: &Kvlm, key: &[u8]) -> Result<ObjectId> {
    let value = kvlm.first(key).ok_or_else(|| {
        Error::Malformed(format!(
            "missing {} header",
            String::from_utf8_lossy(key)
        ))
    })?;
    hex_id(value)
}

fn hex_id(value: &[u8]) -> Result<ObjectId> {
    let hex = std::str::from_utf8(value)
        .map_err(|_| Error::Malformed("non-ascii object id header".to_string()))?;
    ObjectId::from_hex(hex.trim())
}
