use shared::{
    domain::{
        Client, ClientId, Event, EventId, Operator, OperatorId, Order, OrderId, Task, TaskId,
    },
    protocol::{ClientDraft, EventDraft, OperatorDraft, OrderDraft, TaskDraft, TaskPatch},
};

use crate::{error::Result, store::EntityStore, store::Resource};

pub struct Orders;

impl Resource for Orders {
    type Entity = Order;
    type Id = OrderId;
    type Draft = OrderDraft;
    type Patch = OrderDraft;
    const PATH: &'static str = "pedido";

    fn id(entity: &Order) -> OrderId {
        entity.id
    }
}

pub struct Tasks;

impl Resource for Tasks {
    type Entity = Task;
    type Id = TaskId;
    type Draft = TaskDraft;
    type Patch = TaskPatch;
    const PATH: &'static str = "tarea";

    fn id(entity: &Task) -> TaskId {
        entity.id
    }
}

pub struct Events;

impl Resource for Events {
    type Entity = Event;
    type Id = EventId;
    type Draft = EventDraft;
    type Patch = EventDraft;
    const PATH: &'static str = "evento";

    fn id(entity: &Event) -> EventId {
        entity.id
    }
}

pub struct Operators;

impl Resource for Operators {
    type Entity = Operator;
    type Id = OperatorId;
    type Draft = OperatorDraft;
    type Patch = OperatorDraft;
    const PATH: &'static str = "operario";

    fn id(entity: &Operator) -> OperatorId {
        entity.id
    }
}

pub struct Clients;

impl Resource for Clients {
    type Entity = Client;
    type Id = ClientId;
    type Draft = ClientDraft;
    type Patch = ClientDraft;
    const PATH: &'static str = "cliente";

    fn id(entity: &Client) -> ClientId {
        entity.id
    }
}

impl EntityStore<Tasks> {
    /// Marks a task as done. The backend moves it into its completed list.
    pub async fn complete(&self, id: TaskId) -> Result<()> {
        self.update(id, &TaskPatch::completed()).await
    }

    pub async fn assigned_to(&self, operator: OperatorId) -> Vec<Task> {
        self.list()
            .await
            .iter()
            .filter(|task| task.operator_id == operator)
            .cloned()
            .collect()
    }
}
