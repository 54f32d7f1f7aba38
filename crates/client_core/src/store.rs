//! Observable store: named state fields, computed fields derived from them, and actions that
//! mutate state, all reachable through one [`MappedStore`].
//!
//! Every action dispatch and every direct write takes a ticket and claims the fields it may
//! write. A write carrying a ticket that is no longer the latest claim on its field is dropped,
//! so the most recently issued request wins even if an older one completes later.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{debug, warn};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

pub type StoreSnapshot = BTreeMap<String, Value>;

type Derive = Arc<dyn Fn(&StoreSnapshot) -> Value + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    State,
    Computed,
    Action,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreChange {
    pub name: String,
    pub kind: FieldKind,
    pub value: Value,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store '{store}': name '{name}' is declared more than once")]
    DuplicateName { store: String, name: String },
    #[error("store '{store}': computed '{computed}' depends on unknown field '{dependency}'")]
    UnknownDependency {
        store: String,
        computed: String,
        dependency: String,
    },
    #[error("store '{store}': computed fields form a cycle through '{name}'")]
    DependencyCycle { store: String, name: String },
    #[error("store '{store}': action '{action}' writes '{field}', which is not a state field")]
    InvalidWriteTarget {
        store: String,
        action: String,
        field: String,
    },
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("'{0}' is computed and cannot be written")]
    ImmutableField(String),
    #[error("'{0}' is an action, not a field")]
    NotAField(String),
    #[error("'{0}' is not an action")]
    NotAnAction(String),
    #[error("action '{action}' did not declare a write to '{field}'")]
    UndeclaredWrite { action: String, field: String },
    #[error("field '{name}' does not hold the expected type: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("action '{action}' failed: {source}")]
    Action {
        action: String,
        #[source]
        source: anyhow::Error,
    },
}

#[async_trait]
pub trait StoreAction: Send + Sync {
    async fn run(&self, ctx: ActionContext, args: Value) -> anyhow::Result<Value>;
}

/// Adapts a closure returning a boxed future into a [`StoreAction`].
pub struct FnAction<F>(pub F);

#[async_trait]
impl<F> StoreAction for FnAction<F>
where
    F: Fn(ActionContext, Value) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync,
{
    async fn run(&self, ctx: ActionContext, args: Value) -> anyhow::Result<Value> {
        (self.0)(ctx, args).await
    }
}

struct ComputedDefinition {
    name: String,
    dependencies: Vec<String>,
    derive: Derive,
}

#[derive(Clone)]
struct ActionDefinition {
    writes: Arc<[String]>,
    action: Arc<dyn StoreAction>,
}

/// Declarative description of a store, turned into a [`MappedStore`] by
/// [`MappedStore::build`].
pub struct StoreDefinition {
    name: String,
    state: Vec<(String, Value)>,
    computed: Vec<ComputedDefinition>,
    actions: Vec<(String, ActionDefinition)>,
}

impl StoreDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Vec::new(),
            computed: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn state(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.state.push((name.into(), initial.into()));
        self
    }

    /// `derive` only sees the fields listed in `dependencies`, and runs again whenever one of
    /// them changes value.
    pub fn computed<F>(mut self, name: impl Into<String>, dependencies: &[&str], derive: F) -> Self
    where
        F: Fn(&StoreSnapshot) -> Value + Send + Sync + 'static,
    {
        self.computed.push(ComputedDefinition {
            name: name.into(),
            dependencies: dependencies.iter().map(|dep| dep.to_string()).collect(),
            derive: Arc::new(derive),
        });
        self
    }

    pub fn action<A>(mut self, name: impl Into<String>, writes: &[&str], action: A) -> Self
    where
        A: StoreAction + 'static,
    {
        self.actions.push((
            name.into(),
            ActionDefinition {
                writes: writes.iter().map(|field| field.to_string()).collect(),
                action: Arc::new(action),
            },
        ));
        self
    }

    pub fn action_fn<F>(self, name: impl Into<String>, writes: &[&str], action: F) -> Self
    where
        F: Fn(ActionContext, Value) -> BoxFuture<'static, anyhow::Result<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.action(name, writes, FnAction(action))
    }
}

struct StoreData {
    values: StoreSnapshot,
    claims: HashMap<String, u64>,
}

struct StoreInner {
    name: String,
    initial_state: Vec<(String, Value)>,
    kinds: BTreeMap<String, FieldKind>,
    /// Topologically ordered: every computed field comes after its dependencies.
    computed: Vec<ComputedDefinition>,
    actions: HashMap<String, ActionDefinition>,
    data: RwLock<StoreData>,
    next_ticket: AtomicU64,
    events: broadcast::Sender<StoreChange>,
}

impl StoreInner {
    fn ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn derive(computed: &ComputedDefinition, values: &StoreSnapshot) -> Value {
        let inputs = computed
            .dependencies
            .iter()
            .map(|dep| (dep.clone(), values.get(dep).cloned().unwrap_or(Value::Null)))
            .collect::<StoreSnapshot>();
        (computed.derive)(&inputs)
    }

    /// Writes one state field and re-derives the computed fields downstream of it.
    fn apply(&self, data: &mut StoreData, name: &str, value: Value) -> Vec<StoreChange> {
        if data.values.get(name) == Some(&value) {
            return Vec::new();
        }
        data.values.insert(name.to_string(), value.clone());

        let mut changes = vec![StoreChange {
            name: name.to_string(),
            kind: FieldKind::State,
            value,
        }];
        let mut dirty = HashSet::from([name.to_string()]);

        for computed in &self.computed {
            if !computed.dependencies.iter().any(|dep| dirty.contains(dep)) {
                continue;
            }
            let next = Self::derive(computed, &data.values);
            if data.values.get(&computed.name) == Some(&next) {
                continue;
            }
            data.values.insert(computed.name.clone(), next.clone());
            dirty.insert(computed.name.clone());
            changes.push(StoreChange {
                name: computed.name.clone(),
                kind: FieldKind::Computed,
                value: next,
            });
        }

        changes
    }

    fn publish(&self, changes: Vec<StoreChange>) {
        for change in changes {
            // No subscribers is fine.
            let _ = self.events.send(change);
        }
    }
}

/// Single accessor surface over a store's state, computed fields and actions.
#[derive(Clone)]
pub struct MappedStore {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for MappedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedStore")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.kinds)
            .finish()
    }
}

impl MappedStore {
    pub fn build(definition: StoreDefinition) -> Result<Self, StoreError> {
        let StoreDefinition {
            name,
            state,
            computed,
            actions,
        } = definition;

        let mut kinds = BTreeMap::new();
        let names = state
            .iter()
            .map(|(field, _)| (field, FieldKind::State))
            .chain(computed.iter().map(|c| (&c.name, FieldKind::Computed)))
            .chain(actions.iter().map(|(action, _)| (action, FieldKind::Action)));
        for (field, kind) in names {
            if kinds.insert(field.clone(), kind).is_some() {
                return Err(StoreError::DuplicateName {
                    store: name,
                    name: field.clone(),
                });
            }
        }

        for entry in &computed {
            for dependency in &entry.dependencies {
                match kinds.get(dependency) {
                    Some(FieldKind::State | FieldKind::Computed) => {}
                    _ => {
                        return Err(StoreError::UnknownDependency {
                            store: name,
                            computed: entry.name.clone(),
                            dependency: dependency.clone(),
                        })
                    }
                }
            }
        }

        for (action, definition) in &actions {
            if let Some(field) = definition
                .writes
                .iter()
                .find(|field| kinds.get(*field) != Some(&FieldKind::State))
            {
                return Err(StoreError::InvalidWriteTarget {
                    store: name,
                    action: action.clone(),
                    field: field.clone(),
                });
            }
        }

        let computed = order_computed(&name, computed)?;

        let mut values = state.iter().cloned().collect::<StoreSnapshot>();
        for entry in &computed {
            let value = StoreInner::derive(entry, &values);
            values.insert(entry.name.clone(), value);
        }

        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Arc::new(StoreInner {
                name,
                initial_state: state,
                kinds,
                computed,
                actions: actions.into_iter().collect(),
                data: RwLock::new(StoreData {
                    values,
                    claims: HashMap::new(),
                }),
                next_ticket: AtomicU64::new(0),
                events,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn kind(&self, name: &str) -> Option<FieldKind> {
        self.inner.kinds.get(name).copied()
    }

    pub fn fields(&self) -> Vec<(String, FieldKind)> {
        self.inner
            .kinds
            .iter()
            .map(|(name, kind)| (name.clone(), *kind))
            .collect()
    }

    pub async fn get(&self, name: &str) -> Result<Value, StoreError> {
        match self.kind(name) {
            Some(FieldKind::State | FieldKind::Computed) => {}
            Some(FieldKind::Action) => return Err(StoreError::NotAField(name.to_string())),
            None => return Err(StoreError::UnknownField(name.to_string())),
        }
        let data = self.inner.data.read().await;
        Ok(data.values.get(name).cloned().unwrap_or(Value::Null))
    }

    pub async fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, StoreError> {
        let value = self.get(name).await?;
        serde_json::from_value(value).map_err(|source| StoreError::Decode {
            name: name.to_string(),
            source,
        })
    }

    /// State and computed values at one instant.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.inner.data.read().await.values.clone()
    }

    /// Writes a state field directly, superseding any in-flight action that claimed it.
    pub async fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        match self.kind(name) {
            Some(FieldKind::State) => {}
            Some(FieldKind::Computed) => return Err(StoreError::ImmutableField(name.to_string())),
            Some(FieldKind::Action) => return Err(StoreError::NotAField(name.to_string())),
            None => return Err(StoreError::UnknownField(name.to_string())),
        }

        let ticket = self.inner.ticket();
        let changes = {
            let mut data = self.inner.data.write().await;
            data.claims.insert(name.to_string(), ticket);
            self.inner.apply(&mut data, name, value.into())
        };
        self.inner.publish(changes);
        Ok(())
    }

    /// Runs an action to completion. Its error is returned, never swallowed.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<Value, StoreError> {
        let Some(definition) = self.inner.actions.get(name).cloned() else {
            return Err(match self.kind(name) {
                Some(_) => StoreError::NotAnAction(name.to_string()),
                None => StoreError::UnknownField(name.to_string()),
            });
        };

        let ticket = self.inner.ticket();
        {
            let mut data = self.inner.data.write().await;
            for field in definition.writes.iter() {
                data.claims.insert(field.clone(), ticket);
            }
        }
        debug!(store = %self.inner.name, action = name, ticket, "dispatching action");

        let ctx = ActionContext {
            store: self.clone(),
            action: Arc::from(name),
            ticket,
            writes: Arc::clone(&definition.writes),
        };
        definition.action.run(ctx, args).await.map_err(|source| {
            warn!(store = %self.inner.name, action = name, error = %source, "action failed");
            StoreError::Action {
                action: name.to_string(),
                source,
            }
        })
    }

    /// Restores the initial state. In-flight actions lose their claims, so their remaining
    /// writes are dropped.
    pub async fn reset(&self) {
        let ticket = self.inner.ticket();
        let changes = {
            let mut data = self.inner.data.write().await;
            let mut changes = Vec::new();
            for (name, initial) in &self.inner.initial_state {
                data.claims.insert(name.clone(), ticket);
                changes.extend(self.inner.apply(&mut data, name, initial.clone()));
            }
            changes
        };
        debug!(store = %self.inner.name, changed = changes.len(), "store reset");
        self.inner.publish(changes);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.events.subscribe()
    }

    /// Values taken by one field from now on. Notifications lost to a lagging receiver are
    /// skipped.
    pub fn watch(&self, name: &str) -> impl Stream<Item = Value> + Send + 'static {
        let name = name.to_string();
        BroadcastStream::new(self.inner.events.subscribe()).filter_map(move |change| match change {
            Ok(change) if change.name == name => Some(change.value),
            _ => None,
        })
    }
}

/// Handle given to a running action. Reads see the whole store; writes are limited to the
/// fields the action declared.
#[derive(Clone)]
pub struct ActionContext {
    store: MappedStore,
    action: Arc<str>,
    ticket: u64,
    writes: Arc<[String]>,
}

impl ActionContext {
    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub async fn get(&self, name: &str) -> Result<Value, StoreError> {
        self.store.get(name).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, StoreError> {
        self.store.get_as(name).await
    }

    /// Returns `Ok(false)` when a newer request has claimed the field since this action
    /// started; the value is then discarded.
    pub async fn set(&self, name: &str, value: impl Into<Value>) -> Result<bool, StoreError> {
        if !self.writes.iter().any(|field| field == name) {
            return Err(StoreError::UndeclaredWrite {
                action: self.action.to_string(),
                field: name.to_string(),
            });
        }

        let changes = {
            let mut data = self.store.inner.data.write().await;
            if data.claims.get(name) != Some(&self.ticket) {
                debug!(
                    store = %self.store.inner.name,
                    action = %self.action,
                    field = name,
                    ticket = self.ticket,
                    "discarding stale write"
                );
                return Ok(false);
            }
            self.store.inner.apply(&mut data, name, value.into())
        };
        self.store.inner.publish(changes);
        Ok(true)
    }

    /// True once every field this action may write has been claimed by a newer request.
    pub async fn superseded(&self) -> bool {
        let data = self.store.inner.data.read().await;
        self.writes
            .iter()
            .all(|field| data.claims.get(field) != Some(&self.ticket))
    }
}

fn order_computed(
    store: &str,
    computed: Vec<ComputedDefinition>,
) -> Result<Vec<ComputedDefinition>, StoreError> {
    let mut pending = computed;
    let mut ordered: Vec<ComputedDefinition> = Vec::with_capacity(pending.len());
    let all_computed = pending
        .iter()
        .map(|c| c.name.clone())
        .collect::<HashSet<_>>();

    while !pending.is_empty() {
        let ready = pending.iter().position(|candidate| {
            candidate.dependencies.iter().all(|dep| {
                !all_computed.contains(dep) || ordered.iter().any(|done| &done.name == dep)
            })
        });
        match ready {
            Some(position) => ordered.push(pending.remove(position)),
            None => {
                return Err(StoreError::DependencyCycle {
                    store: store.to_string(),
                    name: pending[0].name.clone(),
                })
            }
        }
    }

    Ok(ordered)
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
