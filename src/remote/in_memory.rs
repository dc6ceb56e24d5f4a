//! In-memory relation backend for testing and offline development.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;

use super::{RelationMutator, RelationOp, RemoteError};
use crate::relation::RelationKind;

/// One mutation received by the backend, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationCall {
    pub op: RelationOp,
    pub user_id: String,
    pub kind: RelationKind,
    pub item_id: String,
}

type RowKey = (String, RelationKind, String);

/// In-memory relation table with unique (user, kind, item) rows.
///
/// Features:
/// - Duplicate inserts fail with `RemoteError::Duplicate`
/// - Deleting a missing row succeeds (delete-by-match semantics)
/// - Every call is logged in arrival order
/// - Queued failures per operation via `reject`
/// - Calls are applied on arrival; `pause`/`resume` hold the responses
#[derive(Clone)]
pub struct InMemoryRelationBackend {
    rows: Arc<Mutex<HashSet<RowKey>>>,
    calls: Arc<Mutex<Vec<RelationCall>>>,
    failures: Arc<Mutex<VecDeque<(RelationOp, RemoteError)>>>,
    paused: Arc<watch::Sender<bool>>,
}

impl Default for InMemoryRelationBackend {
    fn default() -> Self {
        Self::new()
    }
}

// Test double state stays usable after a panicking holder.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryRelationBackend {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            rows: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            paused: Arc::new(paused),
        }
    }

    /// Seed an existing relation row without logging a call.
    pub fn seed(&self, user_id: &str, kind: RelationKind, item_id: &str) {
        lock(&self.rows).insert((user_id.to_string(), kind, item_id.to_string()));
    }

    /// Fail the next call of `op` with `error`.
    pub fn reject(&self, op: RelationOp, error: RemoteError) {
        lock(&self.failures).push_back((op, error));
    }

    /// Hold every response until `resume`. Calls are still applied on arrival.
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<RelationCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn is_active(&self, user_id: &str, kind: RelationKind, item_id: &str) -> bool {
        lock(&self.rows).contains(&(user_id.to_string(), kind, item_id.to_string()))
    }

    /// Aggregate number of users holding `kind` on `item_id`.
    pub fn count(&self, kind: RelationKind, item_id: &str) -> u64 {
        lock(&self.rows)
            .iter()
            .filter(|(_, k, item)| *k == kind && item == item_id)
            .count() as u64
    }

    async fn execute(
        &self,
        op: RelationOp,
        user_id: &str,
        kind: RelationKind,
        item_id: &str,
    ) -> Result<(), RemoteError> {
        let result = self.receive(op, user_id, kind, item_id);

        let mut gate = self.paused.subscribe();
        // The sender lives as long as self, so this only returns once resumed.
        let _ = gate.wait_for(|paused| !*paused).await;

        result
    }

    /// Log and apply one call in arrival order.
    fn receive(
        &self,
        op: RelationOp,
        user_id: &str,
        kind: RelationKind,
        item_id: &str,
    ) -> Result<(), RemoteError> {
        // Held throughout so the log order is the order rows change.
        let mut calls = lock(&self.calls);
        calls.push(RelationCall {
            op,
            user_id: user_id.to_string(),
            kind,
            item_id: item_id.to_string(),
        });

        {
            let mut failures = lock(&self.failures);
            if let Some(position) = failures.iter().position(|(failing, _)| *failing == op) {
                if let Some((_, error)) = failures.remove(position) {
                    return Err(error);
                }
            }
        }

        let key = (user_id.to_string(), kind, item_id.to_string());
        let mut rows = lock(&self.rows);
        match op {
            RelationOp::Add => {
                if !rows.insert(key) {
                    return Err(RemoteError::Duplicate);
                }
            }
            RelationOp::Remove => {
                rows.remove(&key);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RelationMutator for InMemoryRelationBackend {
    async fn add_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        item_id: &str,
    ) -> Result<(), RemoteError> {
        self.execute(RelationOp::Add, user_id, kind, item_id).await
    }

    async fn remove_relation(
        &self,
        user_id: &str,
        kind: RelationKind,
        item_id: &str,
    ) -> Result<(), RemoteError> {
        self.execute(RelationOp::Remove, user_id, kind, item_id).await
    }
}
