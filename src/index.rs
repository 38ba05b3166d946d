use std::fs;

use crate::error::{Error, Result};
use crate::hash::{self, ObjectId};
use crate::repo::Repository;

const SIGNATURE: &[u8; 4] = b"DIRC";
const VERSION: u32 = 2;
const HEADER_LEN: usize = 12;
const ENTRY_FIXED_LEN: usize = 62;
const CHECKSUM_LEN: usize = 20;

/// one staged file: the fixed 62-byte header fields plus its path
///
/// all integers are stored big-endian on disk. The high nibble of `mode`
/// selects the object type (0b1000 regular, 0b1010 symlink, 0b1110 gitlink),
/// the low nine bits hold the permissions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub ctime_s: u32,
    pub ctime_n: u32,
    pub mtime_s: u32,
    pub mtime_n: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    pub id: ObjectId,
    pub flags: u16,
    pub path: String,
}

impl IndexEntry {
    /// merge stage, from flag bits 12-13
    pub fn stage(&self) -> u16 {
        (self.flags >> 12) & 0x3
    }

    /// object type nibble of the mode
    pub fn mode_type(&self) -> u32 {
        (self.mode >> 12) & 0xF
    }

    /// permission bits (low nine) of the mode
    pub fn mode_perms(&self) -> u32 {
        self.mode & 0o777
    }
}

/// read the staging index; a missing file is an empty index
pub fn read_index(repo: &Repository) -> Result<Vec<IndexEntry>> {
    let path = repo.git_path("index");
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no index file, treating as empty");
            return Ok(Vec::new());
        }
        Err(source) => return Err(Error::Io { path, source }),
    };

    if data.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(Error::Malformed("truncated index".to_string()));
    }

    let (body, trailer) = data.split_at(data.len() - CHECKSUM_LEN);
    if hash::digest(body).as_bytes() != trailer {
        return Err(Error::InvalidIndexChecksum);
    }

    if &body[0..4] != SIGNATURE {
        return Err(Error::InvalidIndexSignature([
            body[0], body[1], body[2], body[3],
        ]));
    }
    let version = be32(body, 4);
    if version != VERSION {
        return Err(Error::UnknownIndexVersion(version));
    }
    let count = be32(body, 8) as usize;

    let entry_data = &body[HEADER_LEN..];
    let mut entries = Vec::with_capacity(count);
    let mut i = 0;

    while i + ENTRY_FIXED_LEN <= entry_data.len() {
        let name_start = i + ENTRY_FIXED_LEN;
        let name_len = entry_data[name_start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::Malformed("unterminated index path".to_string()))?;
        let path = String::from_utf8_lossy(&entry_data[name_start..name_start + name_len])
            .into_owned();

        entries.push(IndexEntry {
            ctime_s: be32(entry_data, i),
            ctime_n: be32(entry_data, i + 4),
            mtime_s: be32(entry_data, i + 8),
            mtime_n: be32(entry_data, i + 12),
            dev: be32(entry_data, i + 16),
            ino: be32(entry_data, i + 20),
            mode: be32(entry_data, i + 24),
            uid: be32(entry_data, i + 28),
            gid: be32(entry_data, i + 32),
            size: be32(entry_data, i + 36),
            id: ObjectId::from_slice(&entry_data[i + 40..i + 60])?,
            flags: u16::from_be_bytes([entry_data[i + 60], entry_data[i + 61]]),
            path,
        });

        i += padded_len(ENTRY_FIXED_LEN + name_len + 1);
    }

    if entries.len() != count {
        return Err(Error::Malformed(format!(
            "index header declares {} entries, parsed {}",
            count,
            entries.len()
        )));
    }
    Ok(entries)
}

/// rewrite the staging index: entries sorted by path, SHA-1 trailer appended
pub fn write_index(repo: &Repository, entries: &mut Vec<IndexEntry>) -> Result<()> {
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    let mut data = Vec::new();
    data.extend_from_slice(SIGNATURE);
    data.extend_from_slice(&VERSION.to_be_bytes());
    data.extend_from_slice(&(entries.len() as u32).to_be_bytes());

    for entry in entries.iter() {
        for field in [
            entry.ctime_s,
            entry.ctime_n,
            entry.mtime_s,
            entry.mtime_n,
            entry.dev,
            entry.ino,
            entry.mode,
            entry.uid,
            entry.gid,
            entry.size,
        ] {
            data.extend_from_slice(&field.to_be_bytes());
        }
        data.extend_from_slice(entry.id.as_bytes());
        data.extend_from_slice(&entry.flags.to_be_bytes());
        data.extend_from_slice(entry.path.as_bytes());

        // NUL terminator plus padding to the next multiple of 8
        let used = ENTRY_FIXED_LEN + entry.path.len();
        data.resize(data.len() + padded_len(used + 1) - used, 0);
    }

    let digest = hash::digest(&data);
    data.extend_from_slice(digest.as_bytes());
    repo.write_gitfile("index", &data)
}

fn be32(data: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

fn padded_len(n: usize) -> usize {
    (n + 7) / 8 * 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo = Repository::init(&dir.path().join("repo")).unwrap();
        (dir, repo)
    }

    fn sample_entry(path: &str) -> IndexEntry {
        IndexEntry {
            ctime_s: 1700000000,
            ctime_n: 123456789,
            mtime_s: 1700000001,
            mtime_n: 987654321,
            dev: 2050,
            ino: 131072,
            mode: 0o100644,
            uid: 1000,
            gid: 1000,
            size: 6,
            id: ObjectId::from_hex("ce013625030ba8dba906f756967f9e9ca394464a").unwrap(),
            flags: path.len() as u16,
            path: path.to_string(),
        }
    }

    #[test]
    fn test_missing_index_is_empty() {
        let (_dir, repo) = test_repo();
        assert!(read_index(&repo).unwrap().is_empty());
    }

    #[test]
    fn test_roundtrip_sorted_by_path() {
        let (_dir, repo) = test_repo();

        let mut entries = vec![
            sample_entry("zebra.txt"),
            sample_entry("alpha.txt"),
            sample_entry("middle.txt"),
        ];
        write_index(&repo, &mut entries).unwrap();

        let read_back = read_index(&repo).unwrap();
        let paths: Vec<_> = read_back.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["alpha.txt", "middle.txt", "zebra.txt"]);
        assert_eq!(read_back, entries);
    }

    #[test]
    fn test_all_fields_survive() {
        let (_dir, repo) = test_repo();

        let mut entries = vec![sample_entry("hello.txt")];
        write_index(&repo, &mut entries).unwrap();

        let read_back = read_index(&repo).unwrap();
        assert_eq!(read_back[0], entries[0]);
        assert_eq!(read_back[0].stage(), 0);
        assert_eq!(read_back[0].mode_type(), 0b1000);
        assert_eq!(read_back[0].mode_perms(), 0o644);
    }

    #[test]
    fn test_final_entry_at_exact_end() {
        let (_dir, repo) = test_repo();

        // 62 + 9 + 1 = 72, an exact multiple of 8: the entry ends flush
        // against the checksum trailer and must still be parsed
        let path = "painless9";
        assert_eq!((ENTRY_FIXED_LEN + path.len() + 1) % 8, 0);

        let mut entries = vec![sample_entry(path)];
        write_index(&repo, &mut entries).unwrap();

        let read_back = read_index(&repo).unwrap();
        assert_eq!(read_back.len(), 1);
        assert_eq!(read_back[0].path, path);
    }

    #[test]
    fn test_checksum_verified() {
        let (_dir, repo) = test_repo();

        let mut entries = vec![sample_entry("hello.txt")];
        write_index(&repo, &mut entries).unwrap();

        let path = repo.git_path("index");
        let mut data = fs::read(&path).unwrap();
        let len = data.len();
        data[len - 1] ^= 0xFF;
        fs::write(&path, data).unwrap();

        assert!(matches!(
            read_index(&repo),
            Err(Error::InvalidIndexChecksum)
        ));
    }

    #[test]
    fn test_bad_signature_rejected() {
        let (_dir, repo) = test_repo();

        let mut data = Vec::new();
        data.extend_from_slice(b"DIRX");
        data.extend_from_slice(&VERSION.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        let digest = hash::digest(&data);
        data.extend_from_slice(digest.as_bytes());
        repo.write_gitfile("index", &data).unwrap();

        assert!(matches!(
            read_index(&repo),
            Err(Error::InvalidIndexSignature(_))
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let (_dir, repo) = test_repo();

        let mut data = Vec::new();
        data.extend_from_slice(SIGNATURE);
        data.extend_from_slice(&3u32.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        let digest = hash::digest(&data);
        data.extend_from_slice(digest.as_bytes());
        repo.write_gitfile("index", &data).unwrap();

        assert!(matches!(
            read_index(&repo),
            Err(Error::UnknownIndexVersion(3))
        ));
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let (_dir, repo) = test_repo();

        // header claims two entries but only one follows
        let mut data = Vec::new();
        data.extend_from_slice(SIGNATURE);
        data.extend_from_slice(&VERSION.to_be_bytes());
        data.extend_from_slice(&2u32.to_be_bytes());

        let entry = sample_entry("only.txt");
        for field in [
            entry.ctime_s, entry.ctime_n, entry.mtime_s, entry.mtime_n, entry.dev,
            entry.ino, entry.mode, entry.uid, entry.gid, entry.size,
        ] {
            data.extend_from_slice(&field.to_be_bytes());
        }
        data.extend_from_slice(entry.id.as_bytes());
        data.extend_from_slice(&entry.flags.to_be_bytes());
        data.extend_from_slice(entry.path.as_bytes());
        let used = ENTRY_FIXED_LEN + entry.path.len();
        data.resize(data.len() + padded_len(used + 1) - used, 0);

        let digest = hash::digest(&data);
        data.extend_from_slice(digest.as_bytes());
        repo.write_gitfile("index", &data).unwrap();

        assert!(matches!(read_index(&repo), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_stage_bits_exposed() {
        let mut entry = sample_entry("conflicted.txt");
        entry.flags |= 2 << 12;
        assert_eq!(entry.stage(), 2);
    }
}
