use std::collections::{BTreeSet, HashMap};
use std::future::{poll_fn, Future};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::Poll;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{FailurePolicy, PendingToggle, ReconcilerConfig, ToggleError, ToggleFailure, ToggleOutcome};
use crate::relation::{RelationKind, RelationState, Toggleable, ToggleIntent};
use crate::remote::{RelationMutator, RelationOp, RemoteError};
use crate::session::SessionContext;
use crate::store::ItemStore;

const FAILURE_CHANNEL_CAPACITY: usize = 64;

type IntentKey = (String, RelationKind);

/// Latest intent per (item, kind). Sequence numbers are never reused.
#[derive(Default)]
struct Generations {
    next: u64,
    latest: HashMap<IntentKey, u64>,
}

// The map stays consistent even if a holder panicked.
fn lock_generations(generations: &Mutex<Generations>) -> MutexGuard<'_, Generations> {
    generations.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Forgets an intent once its task ends, however it ends.
struct Retire {
    generations: Arc<Mutex<Generations>>,
    key: IntentKey,
    generation: u64,
}

impl Drop for Retire {
    fn drop(&mut self) {
        let mut generations = lock_generations(&self.generations);
        if generations.latest.get(&self.key) == Some(&self.generation) {
            generations.latest.remove(&self.key);
        }
    }
}

/// Generations whose first remote call has started (or never will).
#[derive(Default)]
struct IssueOrder {
    through: u64,
    done: BTreeSet<u64>,
}

impl IssueOrder {
    fn mark(&mut self, generation: u64) {
        if generation <= self.through {
            return;
        }
        self.done.insert(generation);
        while self.done.remove(&(self.through + 1)) {
            self.through += 1;
        }
    }
}

/// Permission to start the first remote call of one generation.
///
/// Released on drop, so an aborted task never holds later toggles back.
struct IssueTurn {
    order: Arc<watch::Sender<IssueOrder>>,
    generation: u64,
}

impl IssueTurn {
    /// Wait until every earlier generation has started its call.
    async fn wait(&self) {
        let mut order = self.order.subscribe();
        // The sender is owned by self, so this cannot close early.
        let _ = order
            .wait_for(|order| order.through + 1 >= self.generation)
            .await;
    }
}

impl Drop for IssueTurn {
    fn drop(&mut self) {
        let generation = self.generation;
        self.order.send_modify(|order| order.mark(generation));
    }
}

struct Shared<S, M: ?Sized> {
    store: Arc<S>,
    mutator: Arc<M>,
    config: ReconcilerConfig,
    generations: Arc<Mutex<Generations>>,
    issued: Arc<watch::Sender<IssueOrder>>,
    failures: broadcast::Sender<ToggleFailure>,
}

/// Applies relation toggles locally, then persists them remotely.
///
/// Local writes always reflect the most recent toggle. Remote calls start in
/// the order their toggles were requested and then complete independently.
/// Remote completions never write back into the store, except for a rollback
/// under [`FailurePolicy::Rollback`] when no later toggle has touched the item.
///
/// `request_toggle` must be called from within a tokio runtime.
pub struct ToggleReconciler<S, M: ?Sized> {
    shared: Arc<Shared<S, M>>,
    session: SessionContext,
}

impl<S, M: ?Sized> Clone for ToggleReconciler<S, M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            session: self.session.clone(),
        }
    }
}

impl<S, M> ToggleReconciler<S, M>
where
    S: ItemStore + 'static,
    M: RelationMutator + ?Sized + 'static,
{
    /// Create a reconciler with the default (keep optimistic) configuration.
    pub fn new(store: Arc<S>, mutator: Arc<M>, session: SessionContext) -> Self {
        Self::with_config(store, mutator, session, ReconcilerConfig::default())
    }

    pub fn with_config(
        store: Arc<S>,
        mutator: Arc<M>,
        session: SessionContext,
        config: ReconcilerConfig,
    ) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        let (issued, _) = watch::channel(IssueOrder::default());
        Self {
            shared: Arc::new(Shared {
                store,
                mutator,
                config,
                generations: Arc::new(Mutex::new(Generations::default())),
                issued: Arc::new(issued),
                failures,
            }),
            session,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.shared.store
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.shared.config
    }

    /// Receive a notification for every toggle whose remote mutation fails.
    pub fn subscribe_failures(&self) -> broadcast::Receiver<ToggleFailure> {
        self.shared.failures.subscribe()
    }

    pub fn toggle_like(
        &self,
        item_id: &str,
        currently_liked: bool,
    ) -> Result<PendingToggle, ToggleError> {
        self.request_toggle(RelationKind::Like, item_id, currently_liked)
    }

    pub fn toggle_bookmark(
        &self,
        item_id: &str,
        currently_bookmarked: bool,
    ) -> Result<PendingToggle, ToggleError> {
        self.request_toggle(RelationKind::Bookmark, item_id, currently_bookmarked)
    }

    /// Flip `kind` on `item_id` away from `current_active`.
    ///
    /// The store is patched before this returns. The matching remote add or
    /// remove is spawned and runs independently of the returned handle.
    pub fn request_toggle(
        &self,
        kind: RelationKind,
        item_id: &str,
        current_active: bool,
    ) -> Result<PendingToggle, ToggleError> {
        let user_id = self.session.user_id().ok_or(ToggleError::Unauthenticated)?;

        // Held across the patch so the recorded generation matches store order.
        let mut generations = self.shared.generations();

        let current = self
            .shared
            .store
            .get(item_id)?
            .ok_or_else(|| ToggleError::NotFound {
                id: item_id.to_string(),
            })?;
        if current.relation(kind).is_none() {
            return Err(ToggleError::UnsupportedRelation {
                id: item_id.to_string(),
                kind,
            });
        }

        let mut transition: Option<(RelationState, RelationState)> = None;
        let patched = self.shared.store.patch(item_id, &mut |item| {
            if let Some(previous) = item.relation(kind) {
                let next = previous.toggled(current_active);
                if item.set_relation(kind, next) {
                    transition = Some((previous, next));
                }
            }
        })?;

        if patched.is_none() {
            debug!(item_id, %kind, "toggle ignored, item not in store");
            return Err(ToggleError::NotFound {
                id: item_id.to_string(),
            });
        }
        let Some((previous, applied)) = transition else {
            return Err(ToggleError::UnsupportedRelation {
                id: item_id.to_string(),
                kind,
            });
        };

        generations.next += 1;
        let generation = generations.next;
        let key = (item_id.to_string(), kind);
        generations.latest.insert(key.clone(), generation);
        drop(generations);

        let intent = ToggleIntent::new(item_id, kind, current_active).with_generation(generation);
        debug!(
            item_id,
            %kind,
            active = applied.active,
            count = ?applied.count,
            generation,
            "applied optimistic toggle"
        );

        // Both guards travel with the task so an abort still releases them.
        let turn = IssueTurn {
            order: Arc::clone(&self.shared.issued),
            generation,
        };
        let retire = Retire {
            generations: Arc::clone(&self.shared.generations),
            key,
            generation,
        };

        let shared = Arc::clone(&self.shared);
        let task_intent = intent.clone();
        let handle = tokio::spawn(async move {
            let _retire = retire;
            shared
                .reconcile(user_id, task_intent, previous, applied, turn)
                .await
        });

        Ok(PendingToggle::new(intent, handle))
    }
}

impl<S, M> Shared<S, M>
where
    S: ItemStore,
    M: RelationMutator + ?Sized,
{
    fn generations(&self) -> MutexGuard<'_, Generations> {
        lock_generations(&self.generations)
    }

    async fn reconcile(
        &self,
        user_id: String,
        intent: ToggleIntent,
        previous: RelationState,
        applied: RelationState,
        turn: IssueTurn,
    ) -> ToggleOutcome {
        let op = RelationOp::for_requested(intent.requested_active);
        let max_attempts = self.config.attempts();
        let mut attempts = 0;
        let mut turn = Some(turn);

        let error = loop {
            attempts += 1;
            let error = match self.attempt(op, &user_id, &intent, turn.take()).await {
                Ok(()) => return self.confirm(&intent, attempts),
                Err(err) if err.is_ignorable() => {
                    debug!(item_id = %intent.item_id, kind = %intent.kind, "remote already in requested state");
                    return self.confirm(&intent, attempts);
                }
                Err(err) => err,
            };

            if !error.is_retryable() || attempts >= max_attempts {
                break error;
            }

            warn!(
                item_id = %intent.item_id,
                kind = %intent.kind,
                attempt = attempts,
                error = %error,
                "remote toggle failed, retrying"
            );
            tokio::time::sleep(self.config.retry_delay()).await;

            if self.is_superseded(&intent) {
                debug!(item_id = %intent.item_id, kind = %intent.kind, "newer toggle issued, abandoning retry");
                break error;
            }
        };

        warn!(
            item_id = %intent.item_id,
            kind = %intent.kind,
            requested = intent.requested_active,
            attempts,
            error = %error,
            "remote toggle failed"
        );

        let rolled_back = match self.config.failure_policy {
            FailurePolicy::Rollback => self.roll_back(&intent, previous, applied),
            FailurePolicy::KeepOptimistic => false,
        };

        // No subscriber is fine.
        let _ = self.failures.send(ToggleFailure {
            intent,
            error: error.clone(),
            rolled_back,
        });

        ToggleOutcome::Failed {
            error,
            attempts,
            rolled_back,
        }
    }

    /// One remote call. With a turn, the call starts only after every earlier
    /// toggle has started its own, and the turn is passed on after the first poll.
    async fn attempt(
        &self,
        op: RelationOp,
        user_id: &str,
        intent: &ToggleIntent,
        turn: Option<IssueTurn>,
    ) -> Result<(), RemoteError> {
        if let Some(turn) = &turn {
            turn.wait().await;
        }

        let mut call = self
            .mutator
            .apply(op, user_id, intent.kind, &intent.item_id);

        let started = poll_fn(|cx| Poll::Ready(call.as_mut().poll(cx))).await;
        drop(turn);
        if let Poll::Ready(result) = started {
            return result;
        }

        match self.config.remote_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(RemoteError::TimedOut(limit))),
            None => call.await,
        }
    }

    fn confirm(&self, intent: &ToggleIntent, attempts: u32) -> ToggleOutcome {
        debug!(
            item_id = %intent.item_id,
            kind = %intent.kind,
            requested = intent.requested_active,
            attempts,
            "remote toggle confirmed"
        );
        ToggleOutcome::Confirmed { attempts }
    }

    fn is_superseded(&self, intent: &ToggleIntent) -> bool {
        let key = (intent.item_id.clone(), intent.kind);
        self.generations().latest.get(&key) != Some(&intent.generation)
    }

    /// Restore `previous` if nothing has written over `applied` since.
    fn roll_back(&self, intent: &ToggleIntent, previous: RelationState, applied: RelationState) -> bool {
        let key = (intent.item_id.clone(), intent.kind);
        let generations = self.generations();
        if generations.latest.get(&key) != Some(&intent.generation) {
            info!(item_id = %intent.item_id, kind = %intent.kind, "rollback skipped, superseded by a later toggle");
            return false;
        }

        let mut restored = false;
        let result = self.store.patch(&intent.item_id, &mut |item| {
            if item.relation(intent.kind) == Some(applied) {
                restored = item.set_relation(intent.kind, previous);
            }
        });

        match result {
            Ok(Some(_)) if restored => {
                info!(
                    item_id = %intent.item_id,
                    kind = %intent.kind,
                    active = previous.active,
                    count = ?previous.count,
                    "rolled back optimistic toggle"
                );
            }
            Ok(_) => {
                info!(item_id = %intent.item_id, kind = %intent.kind, "rollback skipped, item changed since toggle");
            }
            Err(err) => {
                warn!(item_id = %intent.item_id, kind = %intent.kind, error = %err, "rollback failed");
            }
        }

        restored
    }
}
