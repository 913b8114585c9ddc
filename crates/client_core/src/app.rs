use std::sync::Arc;

use chrono::NaiveDate;
use shared::domain::{Event, Order, Task};
use timeline::TimelineItem;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    credentials::CredentialStore,
    error::{ClientError, Result},
    navigation::{gate, Gate, Route},
    resources::{Clients, Events, Operators, Orders, Tasks},
    session::SessionStore,
    store::EntityStore,
    transport::{ApiClient, ClientEvent},
};

/// The three schedule lists as they stood at one instant.
#[derive(Debug, Clone)]
pub struct ScheduleSnapshot {
    pub orders: Arc<Vec<Order>>,
    pub tasks: Arc<Vec<Task>>,
    pub events: Arc<Vec<Event>>,
    /// Applied fetch generation of orders, tasks and events.
    pub generations: [u64; 3],
}

impl ScheduleSnapshot {
    pub fn timeline(&self) -> Vec<TimelineItem> {
        timeline::normalize(&self.orders, &self.tasks, &self.events)
    }

    pub fn timeline_on(&self, today: NaiveDate) -> Vec<TimelineItem> {
        timeline::normalize_on(today, &self.orders, &self.tasks, &self.events)
    }
}

/// Single owner of the api client, the session and every entity store.
pub struct AppState {
    api: Arc<ApiClient>,
    session: SessionStore,
    orders: EntityStore<Orders>,
    tasks: EntityStore<Tasks>,
    events: EntityStore<Events>,
    operators: EntityStore<Operators>,
    clients: EntityStore<Clients>,
}

impl AppState {
    pub fn new(api: Arc<ApiClient>, credentials: Arc<dyn CredentialStore>) -> Arc<Self> {
        Arc::new(Self {
            session: SessionStore::new(Arc::clone(&api), credentials),
            orders: EntityStore::new(Arc::clone(&api)),
            tasks: EntityStore::new(Arc::clone(&api)),
            events: EntityStore::new(Arc::clone(&api)),
            operators: EntityStore::new(Arc::clone(&api)),
            clients: EntityStore::new(Arc::clone(&api)),
            api,
        })
    }

    pub fn connect(base_url: &str, credentials: Arc<dyn CredentialStore>) -> Result<Arc<Self>> {
        let api = Arc::new(ApiClient::new(base_url)?);
        Ok(Self::new(api, credentials))
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn orders(&self) -> &EntityStore<Orders> {
        &self.orders
    }

    pub fn tasks(&self) -> &EntityStore<Tasks> {
        &self.tasks
    }

    pub fn events(&self) -> &EntityStore<Events> {
        &self.events
    }

    pub fn operators(&self) -> &EntityStore<Operators> {
        &self.operators
    }

    pub fn clients(&self) -> &EntityStore<Clients> {
        &self.clients
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ClientEvent> {
        self.api.subscribe_events()
    }

    pub async fn gate(&self, route: Route) -> Gate {
        gate(&self.session.state().await, route)
    }

    /// Forwards transport events to the session so a rejected token logs the
    /// user out wherever the rejection happened.
    pub fn spawn_session_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.api.subscribe_events();
        let app = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "session watcher lagged");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                };
                let Some(app) = app.upgrade() else {
                    break;
                };
                app.session.handle_event(&event).await;
            }
        })
    }

    /// Loads every list once a signed-in identity exists.
    pub async fn load_protected(&self) -> Result<()> {
        self.session.require_user().await?;
        futures::try_join!(
            self.orders.refresh(),
            self.tasks.refresh(),
            self.events.refresh(),
            self.operators.refresh(),
            self.clients.refresh(),
        )?;
        info!("protected data loaded");
        Ok(())
    }

    pub async fn refresh_schedule(&self) -> Result<ScheduleSnapshot> {
        if self.session.current_user().await.is_none() {
            return Err(ClientError::NotLoggedIn);
        }
        futures::try_join!(
            self.orders.refresh(),
            self.tasks.refresh(),
            self.events.refresh(),
        )?;
        Ok(self.schedule_snapshot().await)
    }

    /// Holds all three store locks at once so no refresh lands between reads.
    pub async fn schedule_snapshot(&self) -> ScheduleSnapshot {
        let orders = self.orders.lock_state().await;
        let tasks = self.tasks.lock_state().await;
        let events = self.events.lock_state().await;
        let (orders, tasks, events) = (orders.snapshot(), tasks.snapshot(), events.snapshot());
        ScheduleSnapshot {
            generations: [orders.generation, tasks.generation, events.generation],
            orders: orders.items,
            tasks: tasks.items,
            events: events.items,
        }
    }

    pub async fn timeline(&self) -> Vec<TimelineItem> {
        self.schedule_snapshot().await.timeline()
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
