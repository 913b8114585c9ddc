use chrono::{NaiveDate, Utc};
use serde::Serialize;
use shared::domain::{Event, Order, Task};

/// Id of the row emitted when every source list is empty.
pub const PLACEHOLDER_ID: &str = "dummy";
/// Label of the row emitted when every source list is empty.
pub const PLACEHOLDER_LABEL: &str = "Sin tareas";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Order,
    Task,
    Event,
    Placeholder,
}

impl SourceKind {
    fn id_prefix(self) -> &'static str {
        match self {
            Self::Order => "pedido",
            Self::Task => "tarea",
            Self::Event => "evento",
            Self::Placeholder => PLACEHOLDER_ID,
        }
    }

    fn label_prefix(self) -> &'static str {
        match self {
            Self::Order => "Pedido",
            Self::Task => "Tarea",
            Self::Event => "Evento",
            Self::Placeholder => PLACEHOLDER_LABEL,
        }
    }
}

/// One row of the unified schedule. Serializes to the chart dataset shape
/// `{id, name, start, end, progress}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineItem {
    pub id: String,
    #[serde(rename = "name")]
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub progress: u8,
    #[serde(skip)]
    pub kind: SourceKind,
}

impl TimelineItem {
    fn from_source(
        kind: SourceKind,
        id: i64,
        label: &str,
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Self {
        let start_raw = present(start);
        Self {
            id: format!("{}-{id}", kind.id_prefix()),
            label: format!("{}: {label}", kind.label_prefix()),
            start: calendar_day(start_raw, today),
            end: calendar_day(present(end).or(start_raw), today),
            progress: 0,
            kind,
        }
    }

    fn placeholder(today: NaiveDate) -> Self {
        Self {
            id: PLACEHOLDER_ID.to_string(),
            label: PLACEHOLDER_LABEL.to_string(),
            start: today,
            end: today,
            progress: 0,
            kind: SourceKind::Placeholder,
        }
    }

    /// `end` before `start` is passed through untouched; views use this to
    /// flag the row instead of silently reordering the dates.
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == SourceKind::Placeholder
    }

    /// Inclusive span covered by the row regardless of inversion.
    pub fn span(&self) -> (NaiveDate, NaiveDate) {
        (self.start.min(self.end), self.start.max(self.end))
    }
}

/// Normalizes the three schedule sources against today's UTC date.
pub fn normalize(orders: &[Order], tasks: &[Task], events: &[Event]) -> Vec<TimelineItem> {
    normalize_on(Utc::now().date_naive(), orders, tasks, events)
}

/// Orders first, then tasks, then events, each in input order. Never empty.
pub fn normalize_on(
    today: NaiveDate,
    orders: &[Order],
    tasks: &[Task],
    events: &[Event],
) -> Vec<TimelineItem> {
    let mut items = Vec::with_capacity(orders.len() + tasks.len() + events.len());

    items.extend(orders.iter().map(|order| {
        TimelineItem::from_source(
            SourceKind::Order,
            order.id.0,
            &order.product_type,
            order.expected_date.as_deref(),
            order.delivered_date.as_deref(),
            today,
        )
    }));
    items.extend(tasks.iter().map(|task| {
        TimelineItem::from_source(
            SourceKind::Task,
            task.id.0,
            &task.task_type,
            task.expected_date.as_deref(),
            task.delivered_date.as_deref(),
            today,
        )
    }));
    items.extend(events.iter().map(|event| {
        TimelineItem::from_source(
            SourceKind::Event,
            event.id.0,
            &event.title,
            Some(event.start_date.as_str()),
            event.end_date.as_deref(),
            today,
        )
    }));

    if items.is_empty() {
        items.push(TimelineItem::placeholder(today));
    }
    items
}

/// Reduces a raw backend date to its calendar day. Accepts `YYYY-MM-DD`
/// optionally followed by a time part (`T` or space separated) and a zone;
/// anything else yields `today`.
pub fn calendar_day(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    let Some(raw) = present(raw) else {
        return today;
    };
    let day = raw.split(['T', ' ']).next().unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap_or(today)
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
