//! In-process stand-in for the operations backend, served by axum on an
//! ephemeral port.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

pub const TOKEN: &str = "header.eyJzdWIiOiJhbmFAZXhhbXBsZS5jb20ifQ.signature";
pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "secret";

const COLLECTIONS: [(&str, &str); 5] = [
    ("pedido", "id_pedido"),
    ("tarea", "id_tarea"),
    ("evento", "id_evento"),
    ("operario", "id_operario"),
    ("cliente", "id_cliente"),
];

#[derive(Clone, Default)]
pub struct Backend {
    collections: Arc<Mutex<HashMap<&'static str, Vec<Value>>>>,
    reject_writes: Arc<AtomicBool>,
    revoke_tokens: Arc<AtomicBool>,
    username: Arc<Mutex<String>>,
}

impl Backend {
    pub async fn seed(&self, collection: &'static str, rows: Vec<Value>) {
        self.collections.lock().await.insert(collection, rows);
    }

    pub async fn rows(&self, collection: &'static str) -> Vec<Value> {
        self.collections
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn revoke_tokens(&self, revoke: bool) {
        self.revoke_tokens.store(revoke, Ordering::SeqCst);
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {TOKEN}");
        !self.revoke_tokens.load(Ordering::SeqCst)
            && headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                == Some(expected.as_str())
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn not_authenticated() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Not authenticated")
}

async fn login(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    if body["email"] != EMAIL {
        return detail(StatusCode::UNAUTHORIZED, "Usuario no encontrado");
    }
    if body["password"] != PASSWORD {
        return detail(StatusCode::UNAUTHORIZED, "Contraseña incorrecta");
    }
    let username = backend.username.lock().await.clone();
    Json(json!({
        "access_token": TOKEN,
        "token_type": "bearer",
        "user": { "id": 1, "username": username, "email": EMAIL, "rol": "admin" }
    }))
    .into_response()
}

async fn me(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return not_authenticated();
    }
    let username = backend.username.lock().await.clone();
    Json(json!({
        "id": 1,
        "email": EMAIL,
        "username": username,
        "rol": "admin",
        "id_operario": 4
    }))
    .into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["admin_password"] != "admin" {
        return detail(StatusCode::FORBIDDEN, "Contraseña de administrador incorrecta");
    }
    (StatusCode::CREATED, Json(json!({ "msg": "Usuario creado" }))).into_response()
}

async fn change_password(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !backend.authorized(&headers) {
        return not_authenticated();
    }
    if body["old_password"] != PASSWORD {
        return detail(StatusCode::UNAUTHORIZED, "Contraseña actual incorrecta");
    }
    Json(json!({ "msg": "Contraseña actualizada" })).into_response()
}

async fn update_profile(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !backend.authorized(&headers) {
        return not_authenticated();
    }
    let Some(username) = body["username"].as_str() else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "username requerido");
    };
    *backend.username.lock().await = username.to_string();
    Json(json!({ "msg": "Perfil actualizado" })).into_response()
}

fn collection_routes(name: &'static str, id_field: &'static str) -> Router<Backend> {
    let list = move |State(backend): State<Backend>, headers: HeaderMap| async move {
        if name == "tarea" && !backend.authorized(&headers) {
            return not_authenticated();
        }
        Json(Value::Array(backend.rows(name).await)).into_response()
    };
    let create = move |State(backend): State<Backend>, Json(mut body): Json<Value>| async move {
        if backend.reject_writes.load(Ordering::SeqCst) {
            return detail(StatusCode::BAD_REQUEST, "Datos inválidos");
        }
        let mut collections = backend.collections.lock().await;
        let rows = collections.entry(name).or_default();
        if body.get(id_field).is_none() {
            let next = rows
                .iter()
                .filter_map(|row| row[id_field].as_i64())
                .max()
                .unwrap_or(0)
                + 1;
            body[id_field] = json!(next);
        }
        rows.push(body.clone());
        (StatusCode::CREATED, Json(body)).into_response()
    };
    let update = move |State(backend): State<Backend>,
                       Path(id): Path<i64>,
                       Json(patch): Json<Value>| async move {
        if backend.reject_writes.load(Ordering::SeqCst) {
            return detail(StatusCode::BAD_REQUEST, "Datos inválidos");
        }
        let mut collections = backend.collections.lock().await;
        let rows = collections.entry(name).or_default();
        let Some(row) = rows.iter_mut().find(|row| row[id_field] == id) else {
            return detail(StatusCode::NOT_FOUND, "No encontrado");
        };
        if let (Some(row), Some(patch)) = (row.as_object_mut(), patch.as_object()) {
            for (key, value) in patch {
                row.insert(key.clone(), value.clone());
            }
        }
        Json(row.clone()).into_response()
    };
    let delete = move |State(backend): State<Backend>, Path(id): Path<i64>| async move {
        if backend.reject_writes.load(Ordering::SeqCst) {
            return detail(StatusCode::BAD_REQUEST, "Datos inválidos");
        }
        let mut collections = backend.collections.lock().await;
        let rows = collections.entry(name).or_default();
        let before = rows.len();
        rows.retain(|row| row[id_field] != id);
        if rows.len() == before {
            return detail(StatusCode::NOT_FOUND, "No encontrado");
        }
        StatusCode::NO_CONTENT.into_response()
    };

    Router::new()
        .route(&format!("/{name}"), get(list).post(create))
        .route(&format!("/{name}/:id"), put(update).delete(delete))
}

pub fn router(backend: Backend) -> Router {
    let mut app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/register", post(register))
        .route("/auth/user/password", put(change_password))
        .route("/auth/user/profile", put(update_profile));
    for (name, id_field) in COLLECTIONS {
        app = app.merge(collection_routes(name, id_field));
    }
    app.with_state(backend)
}

/// Serves `router` on 127.0.0.1 and returns its base url.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

pub async fn spawn(backend: Backend) -> String {
    serve(router(backend)).await
}
