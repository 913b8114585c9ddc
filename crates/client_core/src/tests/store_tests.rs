use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use shared::{
    domain::{ClientId, OrderId, TaskId},
    protocol::OperatorDraft,
};
use tokio::sync::{mpsc, oneshot};

use super::*;
use crate::{
    error::ClientError,
    mock_backend::{self, Backend, TOKEN},
    resources::{Clients, Operators, Orders, Tasks},
};

fn order_row(id: i64, product: &str) -> Value {
    json!({ "id_pedido": id, "tipo_producto": product, "fecha_prevista": "2024-01-01" })
}

async fn api_for(backend: Backend) -> Arc<ApiClient> {
    let api = ApiClient::new(&mock_backend::spawn(backend).await).expect("client");
    api.set_credential(Some(TOKEN.to_string())).await;
    Arc::new(api)
}

#[tokio::test]
async fn refresh_replaces_items_and_settles_idle() {
    let backend = Backend::default();
    backend
        .seed("pedido", vec![order_row(1, "Harina"), order_row(2, "Larvas")])
        .await;
    let api = api_for(backend).await;
    let mut events = api.subscribe_events();
    let store = EntityStore::<Orders>::new(Arc::clone(&api));

    assert!(store.list().await.is_empty());
    let outcome = store.refresh().await.expect("refresh");

    assert_eq!(outcome, RefreshOutcome::Applied { generation: 1 });
    assert_eq!(store.list().await.len(), 2);
    assert_eq!(store.phase().await, StorePhase::Idle);
    assert_eq!(
        store.find(OrderId(2)).await.map(|order| order.product_type),
        Some("Larvas".to_string())
    );
    assert_eq!(
        events.recv().await.expect("event"),
        ClientEvent::StoreRefreshed {
            resource: "pedido",
            generation: 1,
            len: 2
        }
    );
}

#[tokio::test]
async fn create_reloads_the_list() {
    let backend = Backend::default();
    let store = EntityStore::<Operators>::new(api_for(backend.clone()).await);

    store
        .create(&OperatorDraft {
            nombre: "Lucía".to_string(),
            turno_trabajo: "mañana".to_string(),
        })
        .await
        .expect("create");

    let operators = store.list().await;
    assert_eq!(operators.len(), 1);
    assert_eq!(operators[0].name, "Lucía");
    assert_eq!(store.phase().await, StorePhase::Idle);
    assert_eq!(backend.rows("operario").await.len(), 1);
}

#[tokio::test]
async fn failed_mutation_keeps_items_and_reports_failure() {
    let backend = Backend::default();
    backend
        .seed(
            "cliente",
            vec![json!({ "id_cliente": 3, "nombre": "Granja Norte" })],
        )
        .await;
    let store = EntityStore::<Clients>::new(api_for(backend.clone()).await);
    store.refresh().await.expect("refresh");
    let before = store.snapshot().await;

    backend.reject_writes(true);
    let err = store.delete(ClientId(3)).await.expect_err("rejected");

    assert!(matches!(err, ClientError::Api(_)));
    let after = store.snapshot().await;
    assert_eq!(after.generation, before.generation);
    assert_eq!(after.items.len(), 1);
    assert_eq!(after.items[0].name, "Granja Norte");
    let phase = store.phase().await;
    assert!(phase.failure().is_some_and(|message| message.contains("Datos inválidos")));
    assert!(!phase.is_busy());
}

#[tokio::test]
async fn completing_a_task_sends_completed_status() {
    let backend = Backend::default();
    backend
        .seed(
            "tarea",
            vec![json!({
                "id_tarea": 5,
                "id_operario": 4,
                "estado": "Pendiente",
                "tipo_tarea": "Limpieza"
            })],
        )
        .await;
    let store = EntityStore::<Tasks>::new(api_for(backend.clone()).await);
    store.refresh().await.expect("refresh");

    store.complete(TaskId(5)).await.expect("complete");

    assert_eq!(backend.rows("tarea").await[0]["estado"], "Completada");
    let task = store.find(TaskId(5)).await.expect("task");
    assert!(task.is_completed());
    assert_eq!(store.assigned_to(task.operator_id).await.len(), 1);
}

#[derive(Clone)]
struct SlowFirstList {
    calls: Arc<AtomicUsize>,
    arrived: mpsc::UnboundedSender<usize>,
    release: Arc<Mutex<Option<oneshot::Receiver<()>>>>,
}

async fn slow_first_orders(State(state): State<SlowFirstList>) -> Json<Value> {
    let call = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
    let _ = state.arrived.send(call);
    if call == 1 {
        let release = state.release.lock().await.take();
        if let Some(release) = release {
            let _ = release.await;
        }
        return Json(json!([order_row(1, "viejo")]));
    }
    Json(json!([order_row(2, "nuevo")]))
}

#[tokio::test]
async fn late_response_from_older_fetch_is_discarded() {
    let (arrived_tx, mut arrived_rx) = mpsc::unbounded_channel();
    let (release_tx, release_rx) = oneshot::channel();
    let router = Router::new()
        .route("/pedido", get(slow_first_orders))
        .with_state(SlowFirstList {
            calls: Arc::new(AtomicUsize::new(0)),
            arrived: arrived_tx,
            release: Arc::new(Mutex::new(Some(release_rx))),
        });
    let api = Arc::new(ApiClient::new(&mock_backend::serve(router).await).expect("client"));
    let store = Arc::new(EntityStore::<Orders>::new(api));

    let first = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.refresh().await }
    });
    assert_eq!(arrived_rx.recv().await, Some(1));

    let second = store.refresh().await.expect("second refresh");
    assert_eq!(second, RefreshOutcome::Applied { generation: 2 });

    release_tx.send(()).expect("release first");
    let first = first.await.expect("join").expect("first refresh");
    assert_eq!(first, RefreshOutcome::Superseded { generation: 1 });

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.generation, 2);
    assert_eq!(snapshot.items[0].product_type, "nuevo");
    assert_eq!(store.phase().await, StorePhase::Idle);
}

#[tokio::test]
async fn refresh_failure_marks_phase_failed() {
    let api = Arc::new(ApiClient::new(&mock_backend::spawn(Backend::default()).await).expect("client"));
    let store = EntityStore::<Tasks>::new(api);

    let err = store.refresh().await.expect_err("tarea needs a bearer token");
    assert!(err.is_unauthenticated());
    assert!(matches!(store.phase().await, StorePhase::Failed(_)));
}
