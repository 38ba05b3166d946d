use crate::error::{Error, Result};
use crate::hash::ObjectId;

/// a single tree record: octal mode, raw name, child object id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    /// 5 or 6 ASCII octal digits, e.g. `100644` or `40000`
    pub mode: Vec<u8>,
    /// raw name bytes, free of NUL
    pub name: Vec<u8>,
    pub id: ObjectId,
}

impl TreeEntry {
    pub fn new(mode: impl Into<Vec<u8>>, name: impl Into<Vec<u8>>, id: ObjectId) -> Self {
        Self {
            mode: mode.into(),
            name: name.into(),
            id,
        }
    }

    pub fn mode_lossy(&self) -> String {
        String::from_utf8_lossy(&self.mode).into_owned()
    }

    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

/// a directory snapshot: ordered records of `<mode> SP <name> NUL <20-byte id>`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<TreeEntry>) -> Self {
        Self { entries }
    }

    /// parse the binary payload of a tree object
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < raw.len() {
            let sp = raw[pos..]
                .iter()
                .position(|&b| b == b' ')
                .map(|i| i + pos)
                .ok_or_else(|| Error::Malformed("tree record without mode".to_string()))?;
            let mode_len = sp - pos;
            if !(5..=6).contains(&mode_len) {
                return Err(Error::Malformed(format!(
                    "tree record mode is {} bytes, expected 5 or 6",
                    mode_len
                )));
            }

            let nul = raw[sp..]
                .iter()
                .position(|&b| b == 0)
                .map(|i| i + sp)
                .ok_or_else(|| Error::Malformed("tree record without name terminator".to_string()))?;
            if raw.len() < nul + 21 {
                return Err(Error::Malformed("truncated tree record".to_string()));
            }

            entries.push(TreeEntry {
                mode: raw[pos..sp].to_vec(),
                name: raw[sp + 1..nul].to_vec(),
                id: ObjectId::from_slice(&raw[nul + 1..nul + 21])?,
            });
            pos = nul + 21;
        }

        Ok(Self { entries })
    }

    /// re-emit records in stored order; no implicit sort
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(&entry.mode);
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.id.as_bytes());
        }
        out
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn push(&mut self, entry: TreeEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
