mod commands;
mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client_core::{AppState, FileCredentialStore, Gate, Route};
use shared::{
    domain::{ClientId, EventId, OperatorId, OrderId, TaskId},
    protocol::Frequency,
};
use timeline::{calendar::CalendarMode, gantt::ViewMode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ops", about = "Orders, tasks and events of the operations backend")]
struct Args {
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Overrides the configured backend url.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        admin_password: String,
        #[arg(long)]
        admin: bool,
    },
    Whoami,
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },
    Events {
        #[command(subcommand)]
        action: EventAction,
    },
    Operators {
        #[command(subcommand)]
        action: OperatorAction,
    },
    Clients {
        #[command(subcommand)]
        action: ClientAction,
    },
    /// Normalized schedule rows shared by the calendar and the Gantt chart.
    Timeline {
        #[arg(long)]
        json: bool,
    },
    Calendar {
        #[arg(long, default_value = "month")]
        mode: CalendarMode,
        /// Day the view is anchored on; defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Worker view instead of the company view.
        #[arg(long)]
        worker: bool,
        /// Periods to move forward (negative moves back).
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        shift: i32,
    },
    Gantt {
        #[arg(long)]
        json: bool,
        #[arg(long, default_value = "day")]
        view: ViewMode,
        #[arg(long, default_value_t = 60)]
        columns: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    Rename {
        username: String,
    },
    Password {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
}

#[derive(clap::Args, Debug)]
struct OrderFields {
    #[arg(long)]
    client: ClientId,
    #[arg(long)]
    product: String,
    #[arg(long, default_value = "Pendiente")]
    status: String,
    #[arg(long, default_value_t = 1)]
    quantity: i64,
    #[arg(long)]
    expected: Option<NaiveDate>,
    #[arg(long)]
    delivered: Option<NaiveDate>,
    #[arg(long)]
    logistics: Option<String>,
}

#[derive(Subcommand, Debug)]
enum OrderAction {
    List,
    Add {
        #[arg(long)]
        id: OrderId,
        #[command(flatten)]
        fields: OrderFields,
    },
    Update {
        id: OrderId,
        #[command(flatten)]
        fields: OrderFields,
    },
    Delete {
        id: OrderId,
    },
}

#[derive(Subcommand, Debug)]
enum TaskAction {
    List {
        /// Only tasks assigned to this operator.
        #[arg(long)]
        operator: Option<OperatorId>,
    },
    Add {
        #[arg(long)]
        operator: OperatorId,
        #[arg(long)]
        kind: String,
        #[arg(long, default_value = "Pendiente")]
        status: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        client: Option<ClientId>,
        #[arg(long)]
        frequency: Option<Frequency>,
        #[arg(long)]
        logistics: Option<String>,
    },
    Complete {
        id: TaskId,
    },
    Status {
        id: TaskId,
        status: String,
    },
    Delete {
        id: TaskId,
    },
}

#[derive(clap::Args, Debug)]
struct EventFields {
    #[arg(long)]
    title: String,
    /// Defaults to the title.
    #[arg(long)]
    kind: Option<String>,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    operator: Option<OperatorId>,
    #[arg(long)]
    task: Option<TaskId>,
}

#[derive(Subcommand, Debug)]
enum EventAction {
    List,
    Add {
        #[command(flatten)]
        fields: EventFields,
    },
    Update {
        id: EventId,
        #[command(flatten)]
        fields: EventFields,
    },
    Delete {
        id: EventId,
    },
}

#[derive(Subcommand, Debug)]
enum OperatorAction {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        shift: String,
    },
    Update {
        id: OperatorId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        shift: String,
    },
    Delete {
        id: OperatorId,
    },
}

#[derive(clap::Args, Debug)]
struct ClientFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    order_note: Option<String>,
    #[arg(long)]
    satisfaction: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ClientAction {
    List,
    Add {
        #[arg(long)]
        id: ClientId,
        #[command(flatten)]
        fields: ClientFields,
    },
    Update {
        id: ClientId,
        #[command(flatten)]
        fields: ClientFields,
    },
    Delete {
        id: ClientId,
    },
}

impl Command {
    fn route(&self) -> Route {
        match self {
            Self::Login { .. } | Self::Logout => Route::Login,
            Self::Register { .. } => Route::Register,
            Self::Whoami | Self::Profile { .. } => Route::Profile,
            Self::Tasks { .. } => Route::Home,
            Self::Orders { .. } | Self::Operators { .. } | Self::Clients { .. } => {
                Route::Management
            }
            Self::Events { .. } | Self::Calendar { .. } => Route::Calendar,
            Self::Timeline { .. } | Self::Gantt { .. } => Route::Gantt,
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(&args.config)?;
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    init_tracing(&settings.log_filter);
    info!(api_url = %settings.api_url, "starting");

    let credentials = Arc::new(FileCredentialStore::new(settings.credential_path.clone()));
    let app = AppState::connect(&settings.api_url, credentials)
        .with_context(|| format!("cannot use backend url '{}'", settings.api_url))?;
    let watcher = app.spawn_session_watcher();

    if let Err(err) = app.session().restore().await {
        warn!(error = %err, "stored session could not be restored");
    }

    let route = args.command.route();
    match app.gate(route).await {
        Gate::Render(_) => {}
        Gate::Redirect(Route::Login) => bail!("not logged in; run `ops login` first"),
        Gate::Redirect(other) => bail!("redirected to {}", other.path()),
        Gate::Pending => bail!("session is still loading"),
    }

    let outcome = commands::run(&app, args.command).await;
    watcher.abort();
    outcome
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
