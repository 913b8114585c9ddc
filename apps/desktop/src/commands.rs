use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use client_core::{AppState, ClientError};
use shared::{
    domain::{Client, ClientId, OrderId, Role, Task, User},
    protocol::{EventDraft, OperatorDraft, OrderDraft, RegisterRequest, TaskDraft, TaskPatch},
};
use timeline::{
    calendar::{self, CalendarEntry, CalendarView},
    gantt::{GanttChart, GanttOptions},
    SourceKind,
};

use crate::{
    ClientAction, ClientFields, Command, EventAction, EventFields, OperatorAction, OrderAction,
    OrderFields, ProfileAction, TaskAction,
};

/// Rejected credentials get a hint instead of the raw transport error.
fn explain(err: ClientError) -> anyhow::Error {
    if err.is_unauthenticated() {
        anyhow!("session expired; run `ops login` again")
    } else {
        anyhow::Error::from(err)
    }
}

fn describe_user(user: &User) -> String {
    let role = if user.is_admin() { "admin" } else { "user" };
    match &user.username {
        Some(username) => format!("{username} <{}> ({role})", user.email),
        None => format!("{} ({role})", user.email),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("-")
}

pub async fn run(app: &Arc<AppState>, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = app
                .session()
                .login(&email, &password)
                .await
                .context("login failed")?;
            println!("logged in as {}", describe_user(&user));
        }
        Command::Logout => {
            app.session().logout().await.map_err(explain)?;
            println!("logged out");
        }
        Command::Register {
            email,
            username,
            password,
            admin_password,
            admin,
        } => {
            let request = RegisterRequest {
                email,
                username,
                password,
                rol: if admin { Role::Admin } else { Role::User },
                admin_password,
            };
            app.session()
                .register(&request)
                .await
                .context("registration failed")?;
            println!("account {} created", request.email);
        }
        Command::Whoami => {
            let user = app.session().require_user().await.map_err(explain)?;
            println!("{}", describe_user(&user));
            if let Some(operator) = user.operator_id {
                println!("operator #{operator}");
            }
        }
        Command::Profile { action } => profile(app, action).await?,
        Command::Orders { action } => orders(app, action).await?,
        Command::Tasks { action } => tasks(app, action).await?,
        Command::Events { action } => events(app, action).await?,
        Command::Operators { action } => operators(app, action).await?,
        Command::Clients { action } => clients(app, action).await?,
        Command::Timeline { json } => {
            let items = app.refresh_schedule().await.map_err(explain)?.timeline();
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in &items {
                    let marker = if item.is_inverted() { "  (fin antes del inicio)" } else { "" };
                    println!("{:<14} {} → {}  {}{marker}", item.id, item.start, item.end, item.label);
                }
            }
        }
        Command::Calendar {
            mode,
            date,
            worker,
            shift,
        } => {
            let entries = calendar_entries(app).await?;
            let mut view = CalendarView::new(Utc::now().date_naive());
            view.set_mode(mode);
            if let Some(date) = date {
                view.navigate(date);
            }
            if worker {
                view.toggle_view();
            }
            for _ in 0..shift.unsigned_abs() {
                if shift > 0 {
                    view.next();
                } else {
                    view.back();
                }
            }
            print!("{}", calendar::render_agenda(&view, &entries));
        }
        Command::Gantt {
            json,
            view,
            columns,
        } => {
            let items = app.refresh_schedule().await.map_err(explain)?.timeline();
            let chart = GanttChart::new(&items).with_options(GanttOptions {
                view_mode: view,
                ..GanttOptions::default()
            });
            if json {
                println!("{}", chart.dataset_json()?);
            } else {
                print!("{}", chart.render_text(columns));
            }
        }
    }
    Ok(())
}

async fn profile(app: &AppState, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Rename { username } => {
            let user = app
                .session()
                .update_profile(&username)
                .await
                .map_err(explain)?;
            println!("profile updated: {}", describe_user(&user));
        }
        ProfileAction::Password { old, new } => {
            app.session()
                .change_password(&old, &new)
                .await
                .context("password change failed")?;
            println!("password changed");
        }
    }
    Ok(())
}

fn order_draft(id: OrderId, fields: OrderFields) -> OrderDraft {
    OrderDraft {
        id_pedido: id,
        id_cliente: fields.client,
        estado: fields.status,
        tipo_producto: fields.product,
        cantidad: fields.quantity,
        fecha_entrega: fields.delivered,
        fecha_prevista: fields.expected,
        logistica: fields.logistics,
    }
}

async fn orders(app: &AppState, action: OrderAction) -> Result<()> {
    let store = app.orders();
    match action {
        OrderAction::List => store.refresh().await.map(|_| ()).map_err(explain)?,
        OrderAction::Add { id, fields } => {
            store.create(&order_draft(id, fields)).await.map_err(explain)?;
        }
        OrderAction::Update { id, fields } => {
            store.update(id, &order_draft(id, fields)).await.map_err(explain)?;
        }
        OrderAction::Delete { id } => store.delete(id).await.map_err(explain)?,
    }
    for order in store.list().await.iter() {
        println!(
            "#{:<5} {:<22} {:<12} x{:<5} {} → {}",
            order.id,
            order.product_type,
            or_dash(order.status.as_deref()),
            order.quantity.unwrap_or_default(),
            or_dash(order.expected_date.as_deref()),
            or_dash(order.delivered_date.as_deref()),
        );
    }
    Ok(())
}

fn print_task(task: &Task, operators: &HashMap<i64, String>) {
    let operator = operators
        .get(&task.operator_id.0)
        .cloned()
        .unwrap_or_else(|| format!("operario #{}", task.operator_id));
    println!(
        "#{:<5} {:<20} {:<12} {:<18} {}",
        task.id,
        task.task_type,
        task.status,
        operator,
        or_dash(task.expected_date.as_deref()),
    );
}

async fn operator_names(app: &AppState) -> Result<HashMap<i64, String>> {
    app.operators().refresh().await.map_err(explain)?;
    Ok(app
        .operators()
        .list()
        .await
        .iter()
        .map(|operator| (operator.id.0, operator.name.clone()))
        .collect())
}

async fn tasks(app: &AppState, action: TaskAction) -> Result<()> {
    let store = app.tasks();
    let mut filter = None;
    match action {
        TaskAction::List { operator } => {
            filter = operator;
            store.refresh().await.map_err(explain)?;
        }
        TaskAction::Add {
            operator,
            kind,
            status,
            description,
            client,
            frequency,
            logistics,
        } => {
            let draft = TaskDraft {
                id_cliente: client,
                id_operario: operator,
                estado: status,
                tipo_tarea: kind,
                descripcion: description,
                frecuencia: frequency,
                logistica: logistics,
            };
            store.create(&draft).await.map_err(explain)?;
        }
        TaskAction::Complete { id } => store.complete(id).await.map_err(explain)?,
        TaskAction::Status { id, status } => {
            store
                .update(id, &TaskPatch { estado: status })
                .await
                .map_err(explain)?;
        }
        TaskAction::Delete { id } => store.delete(id).await.map_err(explain)?,
    }

    let operators = operator_names(app).await?;
    let tasks = match filter {
        Some(operator) => store.assigned_to(operator).await,
        None => store.list().await.to_vec(),
    };
    for task in &tasks {
        print_task(task, &operators);
    }
    Ok(())
}

fn event_draft(fields: EventFields) -> EventDraft {
    let mut draft = EventDraft::new(fields.title, fields.start);
    if let Some(kind) = fields.kind {
        draft.tipo_evento = kind;
    }
    draft.fecha_fin = fields.end;
    draft.descripcion = fields.description;
    draft.id_operario = fields.operator;
    draft.id_tarea = fields.task;
    draft
}

async fn events(app: &AppState, action: EventAction) -> Result<()> {
    let store = app.events();
    match action {
        EventAction::List => store.refresh().await.map(|_| ()).map_err(explain)?,
        EventAction::Add { fields } => store.create(&event_draft(fields)).await.map_err(explain)?,
        EventAction::Update { id, fields } => {
            store.update(id, &event_draft(fields)).await.map_err(explain)?;
        }
        EventAction::Delete { id } => store.delete(id).await.map_err(explain)?,
    }
    for event in store.list().await.iter() {
        println!(
            "#{:<5} {:<24} {} → {}  {}",
            event.id,
            event.title,
            event.start_date,
            or_dash(event.end_date.as_deref()),
            or_dash(event.status.as_deref()),
        );
    }
    Ok(())
}

async fn operators(app: &AppState, action: OperatorAction) -> Result<()> {
    let store = app.operators();
    match action {
        OperatorAction::List => store.refresh().await.map(|_| ()).map_err(explain)?,
        OperatorAction::Add { name, shift } => {
            let draft = OperatorDraft {
                nombre: name,
                turno_trabajo: shift,
            };
            store.create(&draft).await.map_err(explain)?;
        }
        OperatorAction::Update { id, name, shift } => {
            let draft = OperatorDraft {
                nombre: name,
                turno_trabajo: shift,
            };
            store.update(id, &draft).await.map_err(explain)?;
        }
        OperatorAction::Delete { id } => store.delete(id).await.map_err(explain)?,
    }
    for operator in store.list().await.iter() {
        println!("#{:<5} {:<24} {}", operator.id, operator.name, operator.shift);
    }
    Ok(())
}

fn client_record(id: ClientId, fields: ClientFields) -> Client {
    Client {
        id,
        name: fields.name,
        phone: fields.phone,
        address: fields.address,
        order_note: fields.order_note,
        satisfaction: fields.satisfaction,
    }
}

async fn clients(app: &AppState, action: ClientAction) -> Result<()> {
    let store = app.clients();
    match action {
        ClientAction::List => store.refresh().await.map(|_| ()).map_err(explain)?,
        ClientAction::Add { id, fields } => {
            store.create(&client_record(id, fields)).await.map_err(explain)?;
        }
        ClientAction::Update { id, fields } => {
            store.update(id, &client_record(id, fields)).await.map_err(explain)?;
        }
        ClientAction::Delete { id } => store.delete(id).await.map_err(explain)?,
    }
    for client in store.list().await.iter() {
        println!(
            "#{:<5} {:<24} {:<14} {}",
            client.id,
            client.name,
            or_dash(client.phone.as_deref()),
            or_dash(client.address.as_deref()),
        );
    }
    Ok(())
}

/// Calendar rows with task entries labelled by their operator's name.
async fn calendar_entries(app: &AppState) -> Result<Vec<CalendarEntry>> {
    let snapshot = app.refresh_schedule().await.map_err(explain)?;
    let operators = operator_names(app).await?;
    let assignees: HashMap<String, String> = snapshot
        .tasks
        .iter()
        .filter_map(|task| {
            operators
                .get(&task.operator_id.0)
                .map(|name| (format!("tarea-{}", task.id), name.clone()))
        })
        .collect();

    let items = snapshot.timeline();
    Ok(calendar::entries(&items)
        .into_iter()
        .map(|entry| match assignees.get(&entry.id) {
            Some(name) if entry.kind == SourceKind::Task => entry.with_assigned_to(name.clone()),
            _ => entry,
        })
        .collect())
}
