use std::path::{Path, PathBuf};

use configparser::ini::{Ini, IniDefault};

use crate::error::{Error, IoResultExt, Result};

/// repository configuration: the INI-shaped `config` file under the gitdir
pub struct Config {
    ini: Ini,
    path: PathBuf,
}

/// git config dialect: `=` delimiter, `#`/`;` comments, case kept, no multiline
fn ini_defaults() -> IniDefault {
    let mut default = IniDefault::default();
    default.comment_symbols = vec!['#', ';'];
    default.delimiters = vec!['='];
    default.case_sensitive = true;
    default.multiline = false;
    default
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let mut ini = Ini::new_from_defaults(ini_defaults());
        ini.load(path).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(Self {
            ini,
            path: path.to_path_buf(),
        })
    }

    /// write the default config a fresh repository gets
    pub fn create_default(path: &Path) -> Result<Self> {
        let mut ini = Ini::new_from_defaults(ini_defaults());
        ini.setstr("core", "repositoryformatversion", Some("0"));
        ini.setstr("core", "filemode", Some("false"));
        ini.setstr("core", "bare", Some("false"));
        let config = Self {
            ini,
            path: path.to_path_buf(),
        };
        config.save()?;
        Ok(config)
    }

    /// save config to its file
    pub fn save(&self) -> Result<()> {
        self.ini.write(&self.path).with_path(&self.path)
    }

    /// raw key lookup
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    /// raw key update (does not save)
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.setstr(section, key, Some(value));
    }

    /// core.repositoryformatversion, which must be 0
    pub fn format_version(&self) -> Result<u32> {
        let raw = self
            .get("core", "repositoryformatversion")
            .ok_or_else(|| Error::Config {
                path: self.path.clone(),
                message: "missing core.repositoryformatversion".to_string(),
            })?;
        raw.parse()
            .map_err(|_| Error::UnsupportedRepositoryFormat(raw.clone()))
    }

    fn remote_section(name: &str) -> String {
        format!("remote \"{}\"", name)
    }

    fn has_remote(&self, name: &str) -> bool {
        self.ini.get(&Self::remote_section(name), "url").is_some()
    }

    /// add a remote section with url and default fetch refspec (does not save)
    pub fn add_remote(&mut self, name: &str, url: &str) -> Result<()> {
        if self.has_remote(name) {
            return Err(Error::RemoteExists(name.to_string()));
        }
        let section = Self::remote_section(name);
        self.ini.setstr(&section, "url", Some(url));
        let refspec = format!("+refs/heads/*:refs/remotes/{}/*", name);
        self.ini.setstr(&section, "fetch", Some(&refspec));
        Ok(())
    }

    /// remove a remote section (does not save)
    pub fn remove_remote(&mut self, name: &str) -> Result<()> {
        if !self.has_remote(name) {
            return Err(Error::RemoteNotFound(name.to_string()));
        }
        self.ini.remove_section(&Self::remote_section(name));
        Ok(())
    }

    /// move every key of a remote section to a new name (does not save)
    pub fn rename_remote(&mut self, old: &str, new: &str) -> Result<()> {
        if self.has_remote(new) {
            return Err(Error::RemoteExists(new.to_string()));
        }
        let entries = self
            .ini
            .remove_section(&Self::remote_section(old))
            .ok_or_else(|| Error::RemoteNotFound(old.to_string()))?;
        let section = Self::remote_section(new);
        for (key, value) in entries {
            self.ini.set(&section, &key, value);
        }
        Ok(())
    }

    /// url of a remote
    pub fn remote_url(&self, name: &str) -> Result<String> {
        self.get(&Self::remote_section(name), "url")
            .ok_or_else(|| Error::RemoteNotFound(name.to_string()))
    }

    /// (name, url) of every configured remote, sorted by name
    pub fn remotes(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for section in self.ini.sections() {
            let Some(rest) = section.strip_prefix("remote \"") else {
                continue;
            };
            let Some(name) = rest.strip_suffix('"') else {
                continue;
            };
            if let Some(url) = self.ini.get(&section, "url") {
                out.push((name.to_string(), url));
            }
        }
        out.sort();
        out
    }
}
