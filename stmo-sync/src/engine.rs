//! Track / pull / push / fork orchestration.
//!
//! Each tracked file identifier is either untracked (absent from the
//! registry) or tracked. `track` and `fork` are the only ways in; nothing
//! moves a file back out. `pull` and `push` require a tracked file and never
//! merge: pull overwrites the local file with the remote SQL, push overwrites
//! the remote SQL with the local file.
//!
//! Every operation runs sequentially: network first, then the tracked file,
//! then the registry.

use std::path::PathBuf;

use stmo_client::{QueryService, QueryUpdate, RedashClient, ResultSet};
use stmo_core::{AddOutcome, QueryId, QueryRecord, Registry};

use crate::checksum::checksum;
use crate::context::Context;
use crate::error::SyncError;
use crate::stub::default_file_name;
use crate::writer;

// ---------------------------------------------------------------------------
// Inputs and outcomes
// ---------------------------------------------------------------------------

/// How `track` picks the file identifier for a query.
pub enum FileName<'a> {
    /// Use exactly this identifier.
    Fixed(String),
    /// Use the default derived from the query's display name.
    Derived,
    /// Offer the derived default to a callback, which returns the identifier
    /// to use (the default itself to accept it).
    Prompt(&'a mut dyn FnMut(&str) -> std::io::Result<String>),
}

impl FileName<'_> {
    fn resolve(self, record: &QueryRecord) -> Result<String, SyncError> {
        match self {
            FileName::Fixed(file) => Ok(file),
            FileName::Derived => Ok(default_file_name(record)),
            FileName::Prompt(ask) => {
                let default = default_file_name(record);
                let answer = ask(&default).map_err(SyncError::Prompt)?;
                let answer = answer.trim();
                Ok(if answer.is_empty() {
                    default
                } else {
                    answer.to_owned()
                })
            }
        }
    }
}

/// Result of [`Engine::track`] and [`Engine::fork`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOutcome {
    pub file: String,
    pub record: QueryRecord,
    /// Set when `file` was already tracked. The SQL was still written, but
    /// the registry kept this earlier entry.
    pub conflict: Option<QueryRecord>,
}

/// Result of [`Engine::pull`].
#[derive(Debug, Clone, PartialEq)]
pub struct PullOutcome {
    pub file: String,
    pub record: QueryRecord,
    /// The local file existed and differed from the remote SQL before it was
    /// overwritten.
    pub overwrote_local: bool,
}

/// Result of [`Engine::push`].
#[derive(Debug, Clone, PartialEq)]
pub struct PushOutcome {
    pub file: String,
    pub record: QueryRecord,
    /// Hex MD5 of the SQL that was pushed.
    pub checksum: String,
}

/// One entry of a [`Engine::push_many`] batch.
#[derive(Debug)]
pub struct PushItem {
    pub file: String,
    pub result: Result<PushOutcome, SyncError>,
}

/// Result of [`Engine::results`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults {
    pub name: String,
    pub results: ResultSet,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine<S> {
    service: S,
    registry: Registry,
    workdir: PathBuf,
}

impl Engine<RedashClient> {
    /// Wire a Redash client and the on-disk registry from `ctx`.
    pub fn from_context(ctx: &Context) -> Result<Self, SyncError> {
        let service = RedashClient::with_timeout(&ctx.base_url, &ctx.api_key, ctx.timeout);
        let registry = Registry::load_at(ctx.workdir.join(&ctx.registry_path))?;
        Ok(Self::new(service, registry, &ctx.workdir))
    }
}

impl<S: QueryService> Engine<S> {
    pub fn new(service: S, registry: Registry, workdir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            registry,
            workdir: workdir.into(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Filesystem location of a file identifier.
    pub fn path_of(&self, file: &str) -> PathBuf {
        self.workdir.join(file)
    }

    // -----------------------------------------------------------------------
    // track
    // -----------------------------------------------------------------------

    /// Fetch query `id`, write its SQL to a local file and record it.
    ///
    /// The file is written even when its identifier is already tracked; the
    /// registry then keeps its existing entry and the outcome carries a
    /// conflict.
    pub fn track(&mut self, id: &QueryId, file_name: FileName<'_>) -> Result<TrackOutcome, SyncError> {
        let remote = self.service.fetch_query(id)?;
        let file = file_name.resolve(&remote.record)?;

        writer::write_sql(&self.path_of(&file), &remote.sql)?;

        let conflict = match self.registry.add(&file, remote.record.clone())? {
            AddOutcome::Added => {
                tracing::info!(%id, file = %file, "tracking query");
                None
            }
            AddOutcome::AlreadyTracked { existing } => Some(existing),
        };

        Ok(TrackOutcome {
            file,
            record: remote.record,
            conflict,
        })
    }

    // -----------------------------------------------------------------------
    // pull
    // -----------------------------------------------------------------------

    /// Replace the local SQL of a tracked file with the remote SQL and
    /// refresh its metadata. Unpushed local edits are lost.
    pub fn pull(&mut self, file: &str) -> Result<PullOutcome, SyncError> {
        let id = self.registry.get(file)?.id.clone();
        let remote = self.service.fetch_query(&id)?;

        let path = self.path_of(file);
        let overwrote_local = writer::read_existing(&path)?
            .is_some_and(|local| local != remote.sql);
        if overwrote_local {
            tracing::warn!(file, "local changes overwritten by pull");
        }

        writer::write_sql(&path, &remote.sql)?;
        self.registry.update(file, remote.record.clone())?;

        Ok(PullOutcome {
            file: file.to_owned(),
            record: remote.record,
            overwrote_local,
        })
    }

    // -----------------------------------------------------------------------
    // push
    // -----------------------------------------------------------------------

    /// Replace the remote SQL of a tracked file with the local content.
    /// Metadata is sent as recorded; the registry is not touched.
    pub fn push(&self, file: &str) -> Result<PushOutcome, SyncError> {
        let record = self.registry.get(file)?.clone();
        let sql = writer::read_sql(&self.path_of(file))?;

        self.service
            .update_query(&record.id, &QueryUpdate::from_record(&record, &sql))?;
        tracing::info!(id = %record.id, file, "pushed query");

        Ok(PushOutcome {
            file: file.to_owned(),
            record,
            checksum: checksum(&sql),
        })
    }

    /// Push each of `files`, or every tracked file when `files` is empty.
    ///
    /// Items are independent: a failure is recorded and the batch moves on.
    pub fn push_many(&self, files: &[String]) -> Vec<PushItem> {
        let files: Vec<String> = if files.is_empty() {
            self.registry.file_ids().into_iter().collect()
        } else {
            files.to_vec()
        };

        files
            .into_iter()
            .map(|file| {
                let result = self.push(&file);
                if let Err(err) = &result {
                    tracing::warn!(file = %file, error = %err, "push failed");
                }
                PushItem { file, result }
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // fork
    // -----------------------------------------------------------------------

    /// Duplicate query `source` on the service and track the copy as
    /// `new_file`.
    pub fn fork(&mut self, source: &QueryId, new_file: &str) -> Result<TrackOutcome, SyncError> {
        let fork = self.service.fork_query(source)?;
        tracing::info!(%source, fork = %fork.record.id, "forked query");
        self.track(&fork.record.id, FileName::Fixed(new_file.to_owned()))
    }

    // -----------------------------------------------------------------------
    // results / url
    // -----------------------------------------------------------------------

    /// Cached result set of query `id`. The query need not be tracked.
    pub fn results(&self, id: &QueryId) -> Result<QueryResults, SyncError> {
        let remote = self.service.fetch_query(id)?;
        let results = self
            .service
            .fetch_results(&remote.sql, remote.record.data_source_id)?;
        Ok(QueryResults {
            name: remote.record.name,
            results,
        })
    }

    /// Browser URL of a tracked file's query.
    pub fn url_for(&self, file: &str) -> Result<String, SyncError> {
        let record = self.registry.get(file)?;
        Ok(self.service.query_url(&record.id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
