//! Directory scan producing the installable title list.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::{fs, io};

use tracing::{debug, warn};

use crate::{Error, MissPolicy, Result};

/// File extensions served as titles, compared case-insensitively.
pub const TITLE_EXTENSIONS: [&str; 3] = ["nsp", "nsz", "xci"];

/// Returns `true` if `path` has one of the [`TITLE_EXTENSIONS`].
pub fn is_title(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| TITLE_EXTENSIONS.iter().any(|t| ext.eq_ignore_ascii_case(t)))
}

/// Base-name → absolute path mapping built from one directory scan.
///
/// Names keep the case found on disk. When two files share a base-name the
/// later one in traversal order wins, while the name keeps its first
/// position in [`names`](Self::names).
#[derive(Debug, Clone, Default)]
pub struct TitleCatalog {
    /// Distinct names in first-seen order.
    names: Vec<String>,
    /// Resolved path per name.
    paths: HashMap<String, PathBuf>,
}

impl TitleCatalog {
    /// Recursively scans `dir` for title files.
    ///
    /// Entries are visited in sorted order within each directory. Symlinked
    /// directories are not followed; symlinks to files are included.
    /// Unreadable subdirectories and entries are skipped.
    pub fn scan(dir: impl AsRef<Path>) -> io::Result<Self> {
        let root = std::path::absolute(dir.as_ref())?;
        let mut catalog = Self::default();
        catalog.walk(&root)?;
        Ok(catalog)
    }

    fn walk(&mut self, dir: &Path) -> io::Result<()> {
        let mut entries = skip_failed(dir, fs::read_dir(dir)?);
        entries.sort_by_key(fs::DirEntry::file_name);
        let typed = entries
            .into_iter()
            .map(|entry| entry.file_type().map(|t| (entry, t)));

        for (entry, file_type) in skip_failed(dir, typed) {
            let path = entry.path();
            if file_type.is_dir() {
                if let Err(e) = self.walk(&path) {
                    warn!(dir = %path.display(), error = %e, "skipping unreadable directory");
                }
            } else if is_title(&path) && fs::metadata(&path).is_ok_and(|m| m.is_file()) {
                let name = entry.file_name().to_string_lossy().into_owned();
                debug!(name, path = %path.display(), "found title");
                self.insert(name, path);
            }
        }
        Ok(())
    }

    /// Adds or replaces a title.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        let name = name.into();
        if self.paths.insert(name.clone(), path.into()).is_none() {
            self.names.push(name);
        }
    }

    /// Looks up a title by exact base-name.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.paths.get(name).map(PathBuf::as_path)
    }

    /// Title names in traversal order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterates `(name, path)` pairs in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.names
            .iter()
            .filter_map(|n| self.paths.get(n).map(|p| (n.as_str(), p.as_path())))
    }

    /// Number of titles.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no titles were found.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names joined by `\n`, as sent in a `LIST` response.
    pub fn name_list(&self) -> String {
        self.names.join("\n")
    }

    /// UTF-8 bytes of [`name_list`](Self::name_list).
    pub fn name_list_bytes(&self) -> Vec<u8> {
        self.name_list().into_bytes()
    }
}

/// Collects the successful items, logging and dropping the failed ones.
fn skip_failed<T>(dir: &Path, items: impl IntoIterator<Item = io::Result<T>>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| {
            item.inspect_err(|e| {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
            })
            .ok()
        })
        .collect()
}

/// The session's view of the last `LIST` result.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
#[allow(clippy::enum_variant_names)]
pub enum Catalog {
    /// No `LIST` has been served on this connection.
    #[default]
    NoCatalog,
    /// The last `LIST` found no titles.
    EmptyCatalog,
    /// The last `LIST` result.
    Titles(TitleCatalog),
}

impl From<TitleCatalog> for Catalog {
    fn from(titles: TitleCatalog) -> Self {
        if titles.is_empty() {
            Self::EmptyCatalog
        } else {
            Self::Titles(titles)
        }
    }
}

impl Catalog {
    /// Maps a requested name to the file to read.
    ///
    /// Without a populated catalog the name is used as a path. With one,
    /// the name must be a listed title unless `policy` allows a literal
    /// path.
    pub fn resolve(&self, name: &str, policy: MissPolicy) -> Result<PathBuf> {
        match self {
            Self::NoCatalog | Self::EmptyCatalog => Ok(PathBuf::from(name)),
            Self::Titles(titles) => match (titles.get(name), policy) {
                (Some(path), _) => Ok(path.to_path_buf()),
                (None, MissPolicy::LiteralPath) => Ok(PathBuf::from(name)),
                (None, MissPolicy::Reject) => Err(Error::UnknownTitle(name.to_owned())),
            },
        }
    }

    /// The populated catalog, if any.
    pub const fn titles(&self) -> Option<&TitleCatalog> {
        match self {
            Self::Titles(t) => Some(t),
            Self::NoCatalog | Self::EmptyCatalog => None,
        }
    }
}
