use std::path::PathBuf;

use crate::object::ObjectKind;
use crate::ObjectId;

/// error type for grit operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a git repository (or any parent): {0}")]
    NotARepository(PathBuf),

    #[error("unsupported repositoryformatversion {0}")]
    UnsupportedRepositoryFormat(String),

    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("object {id} is a {actual}, expected {expected}")]
    TypeMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("unknown object kind: {0}")]
    UnknownKind(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("no such reference: {0}")]
    NoSuchReference(String),

    #[error("ambiguous reference {name}: candidates are {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    #[error("symbolic ref chain too deep, cycle suspected at {0}")]
    RefCycle(String),

    #[error("invalid ref name: {0}")]
    InvalidRef(String),

    #[error("invalid index checksum")]
    InvalidIndexChecksum,

    #[error("invalid index signature {0:?}")]
    InvalidIndexSignature([u8; 4]),

    #[error("unknown index version {0}")]
    UnknownIndexVersion(u32),

    #[error("index path too long: {0}")]
    PathTooLong(String),

    #[error("flat tree cannot hold nested path: {0}")]
    NestedPath(String),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("directory not empty: {0}")]
    NotEmpty(PathBuf),

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    #[error("remote already exists: {0}")]
    RemoteExists(String),

    #[error("config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
