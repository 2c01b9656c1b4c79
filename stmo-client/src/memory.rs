//! In-process [`QueryService`] that keeps queries in a map.
//!
//! Behaves like the HTTP service where it matters to callers: unknown ids
//! answer 404, forks get fresh ids, results only exist once cached. Failures
//! can be injected with [`MemoryService::fail_next`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use stmo_core::QueryId;

use crate::error::ServiceError;
use crate::service::{QueryService, QueryUpdate, RemoteQuery, ResultSet};

#[derive(Debug, Default)]
pub struct MemoryService {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    queries: BTreeMap<QueryId, RemoteQuery>,
    results: HashMap<String, ResultSet>,
    failures: VecDeque<ServiceError>,
    updates: usize,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a query.
    pub fn insert(&self, query: RemoteQuery) {
        self.lock().queries.insert(query.record.id.clone(), query);
    }

    pub fn get(&self, id: &QueryId) -> Option<RemoteQuery> {
        self.lock().queries.get(id).cloned()
    }

    /// Cache a result set for the exact query text `sql`.
    pub fn cache_results(&self, sql: impl Into<String>, results: ResultSet) {
        self.lock().results.insert(sql.into(), results);
    }

    /// Make the next call, whatever it is, fail with `status`.
    pub fn fail_next(&self, status: u16, body: impl Into<String>) {
        self.lock().failures.push_back(ServiceError::Status {
            status,
            body: body.into(),
        });
    }

    /// Number of successful updates so far.
    pub fn update_count(&self) -> usize {
        self.lock().updates
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn take_failure(&mut self) -> Result<(), ServiceError> {
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn query(&self, id: &QueryId) -> Result<&RemoteQuery, ServiceError> {
        self.queries.get(id).ok_or_else(|| not_found(id))
    }

    fn next_id(&self) -> QueryId {
        let max = self
            .queries
            .keys()
            .filter_map(|id| id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        QueryId::from(max + 1)
    }
}

impl QueryService for MemoryService {
    fn fetch_query(&self, id: &QueryId) -> Result<RemoteQuery, ServiceError> {
        let mut state = self.lock();
        state.take_failure()?;
        state.query(id).cloned()
    }

    fn update_query(&self, id: &QueryId, update: &QueryUpdate<'_>) -> Result<(), ServiceError> {
        let mut state = self.lock();
        state.take_failure()?;
        let query = state.queries.get_mut(id).ok_or_else(|| not_found(id))?;
        query.sql = update.sql.to_owned();
        query.record.name = update.name.to_owned();
        query.record.data_source_id = update.data_source_id;
        query.record.description = update.description.map(str::to_owned);
        query.record.options = update.options.clone();
        state.updates += 1;
        Ok(())
    }

    fn fork_query(&self, id: &QueryId) -> Result<RemoteQuery, ServiceError> {
        let mut state = self.lock();
        state.take_failure()?;
        let mut fork = state.query(id)?.clone();
        fork.record.id = state.next_id();
        fork.record.name = format!("Copy of (#{}) {}", id, fork.record.name);
        state.queries.insert(fork.record.id.clone(), fork.clone());
        Ok(fork)
    }

    fn fetch_results(
        &self,
        sql: &str,
        _data_source_id: Option<u64>,
    ) -> Result<ResultSet, ServiceError> {
        let mut state = self.lock();
        state.take_failure()?;
        state
            .results
            .get(sql)
            .cloned()
            .ok_or(ServiceError::NoCachedResults)
    }

    fn query_url(&self, id: &QueryId) -> String {
        format!("memory://queries/{id}")
    }
}

fn not_found(id: &QueryId) -> ServiceError {
    ServiceError::Status {
        status: 404,
        body: format!("{{\"message\": \"Query {id} not found\"}}"),
    }
}
