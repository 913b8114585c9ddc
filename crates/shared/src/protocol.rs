use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Client, ClientId, OperatorId, Order, OrderId, Role, TaskId};

/// Orders are created with a caller-chosen id and replaced whole on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub id_pedido: OrderId,
    pub id_cliente: ClientId,
    pub estado: String,
    pub tipo_producto: String,
    pub cantidad: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_entrega: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_prevista: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logistica: Option<String>,
}

impl From<&Order> for OrderDraft {
    fn from(order: &Order) -> Self {
        let parse = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|value| value.get(..10))
                .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        };
        Self {
            id_pedido: order.id,
            id_cliente: order.client_id.unwrap_or(ClientId(0)),
            estado: order.status.clone().unwrap_or_default(),
            tipo_producto: order.product_type.clone(),
            cantidad: order.quantity.unwrap_or_default(),
            fecha_entrega: parse(&order.delivered_date),
            fecha_prevista: parse(&order.expected_date),
            logistica: order.logistics.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Diaria,
    Semanal,
    Mensual,
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "diaria" | "daily" => Ok(Self::Diaria),
            "semanal" | "weekly" => Ok(Self::Semanal),
            "mensual" | "monthly" => Ok(Self::Mensual),
            other => Err(format!("unknown frequency '{other}'")),
        }
    }
}

/// The backend derives `fecha_prevista` from `frecuencia` at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub id_cliente: Option<ClientId>,
    pub id_operario: OperatorId,
    pub estado: String,
    pub tipo_tarea: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frecuencia: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logistica: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub estado: String,
}

impl TaskPatch {
    pub fn completed() -> Self {
        Self {
            estado: crate::domain::Task::STATUS_COMPLETED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub titulo: String,
    pub tipo_evento: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    pub fecha_inicio: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_fin: Option<NaiveDate>,
    #[serde(default = "EventDraft::default_status")]
    pub estado: String,
    pub id_operario: Option<OperatorId>,
    pub id_tarea: Option<TaskId>,
}

impl EventDraft {
    pub const DEFAULT_STATUS: &'static str = "Pendiente";

    fn default_status() -> String {
        Self::DEFAULT_STATUS.to_string()
    }

    /// Single-day event whose type mirrors its title.
    pub fn new(title: impl Into<String>, start: NaiveDate) -> Self {
        let titulo = title.into();
        Self {
            tipo_evento: titulo.clone(),
            titulo,
            descripcion: None,
            fecha_inicio: start,
            fecha_fin: None,
            estado: Self::default_status(),
            id_operario: None,
            id_tarea: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDraft {
    pub nombre: String,
    pub turno_trabajo: String,
}

pub type ClientDraft = Client;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "LoginResponse::bearer")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<LoginUserSummary>,
}

impl LoginResponse {
    fn bearer() -> String {
        "bearer".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUserSummary {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    pub rol: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub rol: Role,
    pub admin_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordUpdate {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
}
