//! Generic list stores. Each store owns one backend collection, exposes
//! read-only snapshots, and reloads the whole list after every mutation.
//!
//! Fetches are numbered. A response is applied only when its number is newer
//! than the last applied one, so a slow fetch finishing late can never
//! overwrite a list that a later fetch already delivered.

use std::{fmt, marker::PhantomData, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    transport::{ApiClient, ClientEvent},
};

/// One backend collection.
pub trait Resource: Send + Sync + 'static {
    type Entity: DeserializeOwned + Clone + Send + Sync + 'static;
    type Id: fmt::Display + Copy + PartialEq + Send + Sync;
    type Draft: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;

    /// Collection path relative to the api base url, e.g. `pedido`.
    const PATH: &'static str;

    fn id(entity: &Self::Entity) -> Self::Id;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorePhase {
    #[default]
    Idle,
    Mutating,
    Refreshing,
    Failed(String),
}

impl StorePhase {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Mutating | Self::Refreshing)
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { generation: u64 },
    /// A newer fetch had already been applied; this response was dropped.
    Superseded { generation: u64 },
}

#[derive(Debug)]
pub struct StoreSnapshot<E> {
    pub items: Arc<Vec<E>>,
    pub generation: u64,
}

impl<E> Clone for StoreSnapshot<E> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            generation: self.generation,
        }
    }
}

pub(crate) struct StoreState<E> {
    items: Arc<Vec<E>>,
    phase: StorePhase,
    issued: u64,
    applied: u64,
}

impl<E> StoreState<E> {
    pub(crate) fn snapshot(&self) -> StoreSnapshot<E> {
        StoreSnapshot {
            items: Arc::clone(&self.items),
            generation: self.applied,
        }
    }
}

pub struct EntityStore<R: Resource> {
    api: Arc<ApiClient>,
    state: Mutex<StoreState<R::Entity>>,
    _resource: PhantomData<R>,
}

impl<R: Resource> EntityStore<R> {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: Mutex::new(StoreState {
                items: Arc::new(Vec::new()),
                phase: StorePhase::Idle,
                issued: 0,
                applied: 0,
            }),
            _resource: PhantomData,
        }
    }

    pub async fn list(&self) -> Arc<Vec<R::Entity>> {
        Arc::clone(&self.state.lock().await.items)
    }

    pub async fn snapshot(&self) -> StoreSnapshot<R::Entity> {
        self.state.lock().await.snapshot()
    }

    pub async fn phase(&self) -> StorePhase {
        self.state.lock().await.phase.clone()
    }

    pub async fn find(&self, id: R::Id) -> Option<R::Entity> {
        let items = self.list().await;
        items.iter().find(|entity| R::id(entity) == id).cloned()
    }

    pub(crate) async fn lock_state(&self) -> MutexGuard<'_, StoreState<R::Entity>> {
        self.state.lock().await
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let generation = {
            let mut state = self.state.lock().await;
            state.issued += 1;
            state.phase = StorePhase::Refreshing;
            state.issued
        };

        let fetched = self.api.get_json::<Vec<R::Entity>>(R::PATH).await;

        let mut state = self.state.lock().await;
        let latest = generation == state.issued;
        match fetched {
            Ok(items) if generation > state.applied => {
                let len = items.len();
                state.items = Arc::new(items);
                state.applied = generation;
                if latest {
                    state.phase = StorePhase::Idle;
                }
                drop(state);
                debug!(resource = R::PATH, generation, len, "store refreshed");
                self.api.emit(ClientEvent::StoreRefreshed {
                    resource: R::PATH,
                    generation,
                    len,
                });
                Ok(RefreshOutcome::Applied { generation })
            }
            Ok(_) => {
                debug!(
                    resource = R::PATH,
                    generation,
                    applied = state.applied,
                    "dropping superseded list"
                );
                Ok(RefreshOutcome::Superseded { generation })
            }
            Err(err) => {
                if latest {
                    state.phase = StorePhase::Failed(err.to_string());
                }
                drop(state);
                warn!(resource = R::PATH, generation, error = %err, "store refresh failed");
                self.api.emit(ClientEvent::StoreFailed {
                    resource: R::PATH,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    pub async fn create(&self, draft: &R::Draft) -> Result<()> {
        let path = R::PATH.to_string();
        self.mutate("create", self.api.post(&path, draft)).await
    }

    pub async fn update(&self, id: R::Id, patch: &R::Patch) -> Result<()> {
        let path = format!("{}/{id}", R::PATH);
        self.mutate("update", self.api.put_json(&path, patch)).await
    }

    pub async fn delete(&self, id: R::Id) -> Result<()> {
        let path = format!("{}/{id}", R::PATH);
        self.mutate("delete", self.api.delete(&path)).await
    }

    /// Runs one write, then reloads the list. A failed write leaves the
    /// current items in place and is not retried.
    async fn mutate<F>(&self, action: &'static str, write: F) -> Result<()>
    where
        F: std::future::Future<Output = Result<()>>,
    {
        self.set_phase(StorePhase::Mutating).await;
        if let Err(err) = write.await {
            warn!(resource = R::PATH, action, error = %err, "store mutation failed");
            self.set_phase(StorePhase::Failed(err.to_string())).await;
            self.api.emit(ClientEvent::StoreFailed {
                resource: R::PATH,
                message: err.to_string(),
            });
            return Err(err);
        }
        info!(resource = R::PATH, action, "store mutation applied");
        self.refresh().await.map(|_| ())
    }

    async fn set_phase(&self, phase: StorePhase) {
        self.state.lock().await.phase = phase;
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
