//! File-backed registry of tracked queries.
//!
//! # Storage layout
//!
//! ```text
//! ./.stmocli.conf        JSON object: tracked file identifier -> query metadata
//! ./.stmocli.conf.tmp    transient; only exists between write and rename
//! ```
//!
//! The document is written with sorted keys at every level and two-space
//! indentation so it can be reviewed and diffed under version control.
//!
//! # Persistence
//!
//! Every mutation ([`Registry::add`], [`Registry::update`]) rewrites the whole
//! store: serialize → sibling `.tmp` → `rename`. A reader sees either the old
//! document or the new one, never a torn write.
//!
//! A missing store is an empty registry; it is created on the first mutation.
//! A store that exists but does not parse is an error and is never reset.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, RegistryError};
use crate::types::QueryRecord;

/// Registry location used when the caller does not pick one.
pub const DEFAULT_REGISTRY_PATH: &str = ".stmocli.conf";

/// Result of [`Registry::add`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// A new entry was inserted and persisted.
    Added,
    /// The identifier was already tracked. Nothing changed; `existing` is the
    /// entry that was kept.
    AlreadyTracked { existing: QueryRecord },
}

/// In-memory view of the registry plus the path it persists to.
#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
    entries: BTreeMap<String, QueryRecord>,
}

impl Registry {
    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create an empty store at `path` unless one already exists.
    ///
    /// Returns `true` when a new store was written and `false` when an
    /// existing one was found. Existing content is never touched.
    pub fn initialize_at(path: &Path) -> Result<bool, RegistryError> {
        match std::fs::metadata(path) {
            Ok(_) => {
                tracing::debug!(path = %path.display(), "registry already initialized");
                return Ok(false);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(io_err(path, err)),
        }

        write_atomic(path, &render(&BTreeMap::new())?)?;
        tracing::info!(path = %path.display(), "registry initialized");
        Ok(true)
    }

    /// Load the registry stored at `path`.
    ///
    /// Returns an empty registry if the store does not exist yet,
    /// `RegistryError::Io` if it cannot be read, and `RegistryError::Parse`
    /// (with path and line context) if it is not a valid document.
    pub fn load_at(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    entries: BTreeMap::new(),
                });
            }
            Err(err) => return Err(io_err(path, err)),
        };

        let entries = serde_json::from_str(&contents)
            .map_err(|source| RegistryError::Parse {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Track `file` as `record`.
    ///
    /// First write wins: an identifier that is already tracked is left as is
    /// and reported through [`AddOutcome::AlreadyTracked`].
    pub fn add(&mut self, file: &str, record: QueryRecord) -> Result<AddOutcome, RegistryError> {
        if let Some(existing) = self.entries.get(file) {
            tracing::warn!(file, id = %existing.id, "query already tracked");
            return Ok(AddOutcome::AlreadyTracked {
                existing: existing.clone(),
            });
        }

        let mut next = self.entries.clone();
        next.insert(file.to_owned(), record);
        self.commit(next)?;
        Ok(AddOutcome::Added)
    }

    /// Replace the entry for an already tracked `file`.
    pub fn update(&mut self, file: &str, record: QueryRecord) -> Result<(), RegistryError> {
        if !self.entries.contains_key(file) {
            return Err(RegistryError::NotFound {
                file: file.to_owned(),
            });
        }

        let mut next = self.entries.clone();
        next.insert(file.to_owned(), record);
        self.commit(next)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get(&self, file: &str) -> Result<&QueryRecord, RegistryError> {
        self.entries.get(file).ok_or_else(|| RegistryError::NotFound {
            file: file.to_owned(),
        })
    }

    pub fn contains(&self, file: &str) -> bool {
        self.entries.contains_key(file)
    }

    /// Every tracked file identifier.
    pub fn file_ids(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// Entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryRecord)> {
        self.entries.iter().map(|(file, record)| (file.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -----------------------------------------------------------------------
    // Save (atomic)
    // -----------------------------------------------------------------------

    /// Persist `next` and only then adopt it, so a failed write leaves the
    /// in-memory view matching the disk.
    fn commit(&mut self, next: BTreeMap<String, QueryRecord>) -> Result<(), RegistryError> {
        write_atomic(&self.path, &render(&next)?)?;
        self.entries = next;
        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "registry saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn render(entries: &BTreeMap<String, QueryRecord>) -> Result<String, RegistryError> {
    // Going through `Value` sorts the keys of the record fields and of the
    // opaque `options`/`schedule` objects as well.
    let value = serde_json::to_value(entries)?;
    let mut out = serde_json::to_string_pretty(&value)?;
    out.push('\n');
    Ok(out)
}

/// `<path>.tmp` in the same directory as the target (same filesystem, so the
/// rename cannot fail with EXDEV).
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), RegistryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let tmp = tmp_path(path);
    let result = std::fs::write(&tmp, contents)
        .map_err(|e| io_err(&tmp, e))
        .and_then(|()| std::fs::rename(&tmp, path).map_err(|e| io_err(path, e)));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
