//! In-process backend
//!
//! Implements the full service contract in memory: per-user collections,
//! live full-snapshot subscriptions, anonymous auth and the four record
//! mutations. Used by the demo binary and by tests, with one-shot fault
//! injection for every failure class the engine must survive.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use shared::models::{Collection, Document, Scope};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::{
    AuthProvider, BackendError, LiveCollections, RecordService, SnapshotResult, Subscription,
    UserId,
};

/// Mutation kind, used for fault injection and write accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
    Upsert,
}

struct Listener {
    scope: Scope,
    tx: mpsc::UnboundedSender<SnapshotResult>,
    cancel: CancellationToken,
}

impl Listener {
    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && !self.tx.is_closed()
    }
}

#[derive(Default)]
struct State {
    records: HashMap<Scope, BTreeMap<String, Map<String, Value>>>,
    listeners: Vec<Listener>,
}

impl State {
    fn snapshot(&self, scope: &Scope) -> Vec<Document> {
        self.records
            .get(scope)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Push the scope's current contents to every live listener of it
    fn notify(&mut self, scope: &Scope) {
        self.listeners.retain(Listener::is_live);
        let snapshot = self.snapshot(scope);
        for listener in self.listeners.iter().filter(|l| &l.scope == scope) {
            let _ = listener.tx.send(Ok(snapshot.clone()));
        }
    }
}

/// In-memory implementation of [`AuthProvider`], [`LiveCollections`] and
/// [`RecordService`]
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    user_tx: Arc<watch::Sender<Option<UserId>>>,
    write_failures: Arc<DashMap<WriteOp, BackendError>>,
    sign_in_failure: Arc<Mutex<Option<BackendError>>>,
    write_counts: Arc<DashMap<(Collection, WriteOp), u64>>,
    write_gates: Arc<DashMap<WriteOp, CancellationToken>>,
    held_writes: Arc<AtomicUsize>,
}

/// Decrements the held-write count however the write ends
struct HeldWrite<'a>(&'a AtomicUsize);

impl Drop for HeldWrite<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("user", &*self.user_tx.borrow())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (user_tx, _) = watch::channel(None);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            user_tx: Arc::new(user_tx),
            write_failures: Arc::new(DashMap::new()),
            sign_in_failure: Arc::new(Mutex::new(None)),
            write_counts: Arc::new(DashMap::new()),
            write_gates: Arc::new(DashMap::new()),
            held_writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start with an already signed-in user
    pub fn with_user(user_id: impl Into<UserId>) -> Self {
        let backend = Self::new();
        backend.sign_in_as(user_id);
        backend
    }

    pub fn sign_in_as(&self, user_id: impl Into<UserId>) {
        self.user_tx.send_replace(Some(user_id.into()));
    }

    pub fn sign_out(&self) {
        self.user_tx.send_replace(None);
    }

    /// Make the next anonymous sign-in fail
    pub fn fail_sign_in(&self, err: BackendError) {
        *self.sign_in_failure.lock() = Some(err);
    }

    /// Make the next mutation of kind `op` fail without applying it
    pub fn fail_next(&self, op: WriteOp, err: BackendError) {
        self.write_failures.insert(op, err);
    }

    /// Stall every mutation of kind `op` until [`MemoryBackend::release_writes`]
    pub fn hold_writes(&self, op: WriteOp) {
        self.write_gates.entry(op).or_default();
    }

    /// Let stalled and future mutations of kind `op` through
    pub fn release_writes(&self, op: WriteOp) {
        if let Some((_, gate)) = self.write_gates.remove(&op) {
            gate.cancel();
        }
    }

    /// Mutations currently stalled by [`MemoryBackend::hold_writes`]
    pub fn held_writes(&self) -> usize {
        self.held_writes.load(Ordering::SeqCst)
    }

    /// Report `err` to every live listener of `collection` and close them
    pub fn fail_subscription(&self, collection: Collection, err: BackendError) {
        let mut state = self.state.lock();
        for listener in state
            .listeners
            .iter()
            .filter(|l| l.scope.collection == collection)
        {
            let _ = listener.tx.send(Err(err.clone()));
        }
        state.listeners.retain(|l| l.scope.collection != collection);
    }

    /// Number of listeners not yet released
    pub fn listener_count(&self) -> usize {
        self.state
            .lock()
            .listeners
            .iter()
            .filter(|l| l.is_live())
            .count()
    }

    /// Number of live auth-state watchers
    pub fn auth_watchers(&self) -> usize {
        self.user_tx.receiver_count()
    }

    /// Current contents of a scope
    pub fn documents(&self, scope: &Scope) -> Vec<Document> {
        self.state.lock().snapshot(scope)
    }

    pub fn document(&self, scope: &Scope, id: &str) -> Option<Document> {
        self.state
            .lock()
            .records
            .get(scope)?
            .get(id)
            .map(|data| Document::new(id, data.clone()))
    }

    /// Successful writes of kind `op` to `collection`
    pub fn write_count(&self, collection: Collection, op: WriteOp) -> u64 {
        self.write_counts
            .get(&(collection, op))
            .map(|c| *c)
            .unwrap_or(0)
    }

    async fn pass_gate(&self, op: WriteOp) {
        let gate = self.write_gates.get(&op).map(|g| g.clone());
        if let Some(gate) = gate {
            self.held_writes.fetch_add(1, Ordering::SeqCst);
            let _held = HeldWrite(&self.held_writes);
            gate.cancelled().await;
        }
    }

    fn take_failure(&self, op: WriteOp) -> Result<(), BackendError> {
        match self.write_failures.remove(&op) {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }

    fn count_write(&self, collection: Collection, op: WriteOp) {
        *self.write_counts.entry((collection, op)).or_insert(0) += 1;
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn current_user(&self) -> Option<UserId> {
        self.user_tx.borrow().clone()
    }

    async fn sign_in_anonymously(&self) -> Result<UserId, BackendError> {
        if let Some(err) = self.sign_in_failure.lock().take() {
            return Err(err);
        }
        let user_id = uuid::Uuid::new_v4().simple().to_string();
        self.user_tx.send_replace(Some(user_id.clone()));
        Ok(user_id)
    }

    fn watch_user(&self) -> watch::Receiver<Option<UserId>> {
        self.user_tx.subscribe()
    }
}

#[async_trait]
impl LiveCollections for MemoryBackend {
    async fn subscribe(&self, scope: &Scope) -> Result<Subscription, BackendError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let mut state = self.state.lock();
        // The first notification is the current contents, even when empty
        let _ = tx.send(Ok(state.snapshot(scope)));
        state.listeners.push(Listener {
            scope: scope.clone(),
            tx,
            cancel: cancel.clone(),
        });

        Ok(Subscription::new(rx, cancel))
    }
}

#[async_trait]
impl RecordService for MemoryBackend {
    async fn create(
        &self,
        scope: &Scope,
        data: Map<String, Value>,
    ) -> Result<String, BackendError> {
        self.pass_gate(WriteOp::Create).await;
        self.take_failure(WriteOp::Create)?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut state = self.state.lock();
        state
            .records
            .entry(scope.clone())
            .or_default()
            .insert(id.clone(), data);
        state.notify(scope);
        drop(state);
        self.count_write(scope.collection, WriteOp::Create);
        Ok(id)
    }

    async fn merge_update(
        &self,
        scope: &Scope,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), BackendError> {
        self.pass_gate(WriteOp::Update).await;
        self.take_failure(WriteOp::Update)?;
        let mut state = self.state.lock();
        let existing = state
            .records
            .get_mut(scope)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| BackendError::NotFound(format!("{}/{}", scope, id)))?;
        existing.extend(data);
        state.notify(scope);
        drop(state);
        self.count_write(scope.collection, WriteOp::Update);
        Ok(())
    }

    async fn delete(&self, scope: &Scope, id: &str) -> Result<(), BackendError> {
        self.pass_gate(WriteOp::Delete).await;
        self.take_failure(WriteOp::Delete)?;
        let mut state = self.state.lock();
        if let Some(docs) = state.records.get_mut(scope) {
            docs.remove(id);
        }
        state.notify(scope);
        drop(state);
        self.count_write(scope.collection, WriteOp::Delete);
        Ok(())
    }

    async fn upsert(
        &self,
        scope: &Scope,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), BackendError> {
        self.pass_gate(WriteOp::Upsert).await;
        self.take_failure(WriteOp::Upsert)?;
        let mut state = self.state.lock();
        state
            .records
            .entry(scope.clone())
            .or_default()
            .entry(id.to_string())
            .or_default()
            .extend(data);
        state.notify(scope);
        drop(state);
        self.count_write(scope.collection, WriteOp::Upsert);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_then_changes() {
        let backend = MemoryBackend::with_user("u1");
        let scope = Scope::new("u1", Collection::Products);

        let mut sub = backend.subscribe(&scope).await.unwrap();
        assert!(sub.next().await.unwrap().unwrap().is_empty());

        let id = backend
            .create(&scope, fields(json!({"name": "Belt", "color": "Black", "price": 120})))
            .await
            .unwrap();
        let docs = sub.next().await.unwrap().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
    }

    #[tokio::test]
    async fn test_scopes_are_isolated_per_user() {
        let backend = MemoryBackend::new();
        let mine = Scope::new("u1", Collection::Orders);
        let theirs = Scope::new("u2", Collection::Orders);
        backend.create(&mine, fields(json!({"city": "Fes"}))).await.unwrap();
        assert_eq!(backend.documents(&mine).len(), 1);
        assert!(backend.documents(&theirs).is_empty());
    }

    #[tokio::test]
    async fn test_merge_update_requires_existing_record() {
        let backend = MemoryBackend::new();
        let scope = Scope::new("u1", Collection::Inventory);
        let err = backend
            .merge_update(&scope, "missing", fields(json!({"stock": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert_creates_then_merges() {
        let backend = MemoryBackend::new();
        let scope = Scope::new("u1", Collection::Expenses);
        backend
            .upsert(&scope, "autoShipping", fields(json!({"amount": 20, "note": "keep"})))
            .await
            .unwrap();
        backend
            .upsert(&scope, "autoShipping", fields(json!({"amount": 50})))
            .await
            .unwrap();
        let doc = backend.document(&scope, "autoShipping").unwrap();
        assert_eq!(doc.data["amount"], json!(50));
        assert_eq!(doc.data["note"], json!("keep"));
        assert_eq!(backend.write_count(Collection::Expenses, WriteOp::Upsert), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot_and_not_applied() {
        let backend = MemoryBackend::new();
        let scope = Scope::new("u1", Collection::Products);
        backend.fail_next(
            WriteOp::Create,
            BackendError::PermissionDenied("rules".to_string()),
        );
        assert!(backend.create(&scope, Map::new()).await.is_err());
        assert!(backend.documents(&scope).is_empty());
        assert!(backend.create(&scope, Map::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_held_writes_wait_for_release() {
        let backend = MemoryBackend::new();
        let scope = Scope::new("u1", Collection::Expenses);
        backend.hold_writes(WriteOp::Upsert);

        let writer = {
            let backend = backend.clone();
            let scope = scope.clone();
            tokio::spawn(async move {
                backend
                    .upsert(&scope, "autoShipping", fields(json!({"amount": 20})))
                    .await
            })
        };
        while backend.held_writes() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(backend.document(&scope, "autoShipping").is_none());

        backend.release_writes(WriteOp::Upsert);
        writer.await.unwrap().unwrap();
        assert_eq!(backend.held_writes(), 0);
        assert!(backend.document(&scope, "autoShipping").is_some());
    }

    #[tokio::test]
    async fn test_dropped_subscription_releases_listener() {
        let backend = MemoryBackend::new();
        let sub = backend
            .subscribe(&Scope::new("u1", Collection::Orders))
            .await
            .unwrap();
        assert_eq!(backend.listener_count(), 1);
        drop(sub);
        assert_eq!(backend.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_fail_subscription_reports_and_closes() {
        let backend = MemoryBackend::new();
        let mut orders = backend
            .subscribe(&Scope::new("u1", Collection::Orders))
            .await
            .unwrap();
        let _products = backend
            .subscribe(&Scope::new("u1", Collection::Products))
            .await
            .unwrap();
        let _ = orders.next().await;

        backend.fail_subscription(
            Collection::Orders,
            BackendError::PermissionDenied("rules".to_string()),
        );
        assert!(matches!(orders.next().await, Some(Err(_))));
        assert!(orders.next().await.is_none());
        assert_eq!(backend.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_sign_in() {
        let backend = MemoryBackend::new();
        assert!(backend.current_user().await.is_none());
        let uid = backend.sign_in_anonymously().await.unwrap();
        assert_eq!(backend.current_user().await, Some(uid));

        backend.fail_sign_in(BackendError::Auth {
            code: "auth/api-key-not-valid".to_string(),
            message: "bad key".to_string(),
        });
        assert!(backend.sign_in_anonymously().await.is_err());
    }
}
