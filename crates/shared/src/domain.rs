use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                value.trim().parse().map(Self)
            }
        }
    };
}

id_newtype!(OrderId);
id_newtype!(TaskId);
id_newtype!(EventId);
id_newtype!(OperatorId);
id_newtype!(ClientId);
id_newtype!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

/// Customer order (`pedido`). Dates stay raw: the backend sends ISO datetimes,
/// plain dates or nulls depending on the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "id_pedido")]
    pub id: OrderId,
    #[serde(rename = "id_cliente", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "tipo_producto")]
    pub product_type: String,
    #[serde(rename = "cantidad", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(rename = "fecha_prevista", default)]
    pub expected_date: Option<String>,
    #[serde(rename = "fecha_entrega", default)]
    pub delivered_date: Option<String>,
    #[serde(rename = "logistica", default, skip_serializing_if = "Option::is_none")]
    pub logistics: Option<String>,
}

/// Work item (`tarea`) assigned to one operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "id_tarea")]
    pub id: TaskId,
    #[serde(rename = "id_cliente", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(rename = "id_operario")]
    pub operator_id: OperatorId,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "tipo_tarea")]
    pub task_type: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "cantidad", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(rename = "fecha_prevista", default)]
    pub expected_date: Option<String>,
    #[serde(rename = "fecha_entrega", default)]
    pub delivered_date: Option<String>,
    #[serde(rename = "fecha_creacion", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "logistica", default, skip_serializing_if = "Option::is_none")]
    pub logistics: Option<String>,
}

impl Task {
    pub const STATUS_COMPLETED: &'static str = "Completada";

    pub fn is_completed(&self) -> bool {
        self.status == Self::STATUS_COMPLETED
    }
}

/// Calendar event (`evento`). `fecha_inicio` is mandatory on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "id_evento")]
    pub id: EventId,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "tipo_evento", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "fecha_inicio")]
    pub start_date: String,
    #[serde(rename = "fecha_fin", default)]
    pub end_date: Option<String>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "id_operario", default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<OperatorId>,
    #[serde(rename = "id_tarea", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    #[serde(rename = "id_operario")]
    pub id: OperatorId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "turno_trabajo")]
    pub shift: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(rename = "id_cliente")]
    pub id: ClientId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    #[serde(rename = "pedido", default)]
    pub order_note: Option<String>,
    #[serde(rename = "satisfaccion", default)]
    pub satisfaction: Option<String>,
}

/// Identity returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "id_operario", default)]
    pub operator_id: Option<OperatorId>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
