use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};

const DEFAULT_DESCRIPTION: &str =
    "Unnamed repository: edit this file 'description' to name the repository.\n";

/// a grit repository: a worktree plus its `.git` metadata directory
pub struct Repository {
    worktree: PathBuf,
    gitdir: PathBuf,
    config: Config,
}

impl Repository {
    /// open an existing repository rooted at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let worktree = path.to_path_buf();
        let gitdir = worktree.join(".git");
        if !gitdir.is_dir() {
            return Err(Error::NotARepository(worktree));
        }

        let config = Config::load(&gitdir.join("config"))?;
        let repo = Self {
            worktree,
            gitdir,
            config,
        };

        let version = repo.config.format_version()?;
        if version != 0 {
            return Err(Error::UnsupportedRepositoryFormat(version.to_string()));
        }
        Ok(repo)
    }

    /// walk upward from `start` until a `.git` directory is found
    pub fn find(start: &Path) -> Result<Self> {
        let mut dir = start.canonicalize().with_path(start)?;
        loop {
            if dir.join(".git").is_dir() {
                log::debug!("found repository at {}", dir.display());
                return Self::open(&dir);
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => return Err(Error::NotARepository(start.to_path_buf())),
            }
        }
    }

    /// create a new repository scaffold at `path`
    ///
    /// the path must not exist yet, or be an empty directory
    pub fn init(path: &Path) -> Result<Self> {
        if path.exists() {
            if !path.is_dir() {
                return Err(Error::NotADirectory(path.to_path_buf()));
            }
            if path.read_dir().with_path(path)?.next().is_some() {
                return Err(Error::NotEmpty(path.to_path_buf()));
            }
        } else {
            fs::create_dir_all(path).with_path(path)?;
        }

        let gitdir = path.join(".git");
        for dir in ["objects", "refs/heads", "refs/tags", "branches"] {
            fs::create_dir_all(gitdir.join(dir)).with_path(gitdir.join(dir))?;
        }

        fs::write(gitdir.join("description"), DEFAULT_DESCRIPTION)
            .with_path(gitdir.join("description"))?;
        fs::write(gitdir.join("HEAD"), "ref: refs/heads/master\n")
            .with_path(gitdir.join("HEAD"))?;
        let config = Config::create_default(&gitdir.join("config"))?;

        Ok(Self {
            worktree: path.to_path_buf(),
            gitdir,
            config,
        })
    }

    /// working tree root
    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    /// metadata directory
    pub fn gitdir(&self) -> &Path {
        &self.gitdir
    }

    /// repository configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// mutable access to configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// save configuration changes
    pub fn save_config(&self) -> Result<()> {
        self.config.save()
    }

    /// join a logical path under the metadata directory
    pub fn git_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.gitdir.join(rel)
    }

    /// directory under the metadata directory, created if absent
    pub fn git_dir(&self, rel: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.git_path(rel);
        if path.exists() {
            if !path.is_dir() {
                return Err(Error::NotADirectory(path));
            }
            return Ok(path);
        }
        fs::create_dir_all(&path).with_path(&path)?;
        Ok(path)
    }

    /// file path under the metadata directory with parent directories ensured
    pub fn git_file(&self, rel: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.git_path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_path(parent)?;
        }
        Ok(path)
    }

    /// replace a file under the metadata directory via temp file + rename
    pub fn write_gitfile(&self, rel: impl AsRef<Path>, data: &[u8]) -> Result<()> {
        let path = self.git_file(rel)?;
        let mut tmp = NamedTempFile::new_in(&self.gitdir).with_path(&self.gitdir)?;
        tmp.write_all(data).with_path(&path)?;
        tmp.persist(&path).map_err(|e| Error::Io {
            path: path.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}
