//! Calendar view model: a navigable month/week/day window over timeline
//! items plus the owner/worker visibility toggle.

use std::fmt::Write as _;

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::normalize::{SourceKind, TimelineItem};

/// Creator tag carried by company-side records (orders and events).
pub const COMPANY_CREATOR: &str = "empresa";
/// Assignee literal the worker view matches on.
pub const OPERATOR_ASSIGNEE: &str = "operario";

const NO_EVENTS: &str = "No hay eventos en este periodo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kind: SourceKind,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
}

impl CalendarEntry {
    pub fn from_item(item: &TimelineItem) -> Self {
        let created_by = match item.kind {
            SourceKind::Order | SourceKind::Event => Some(COMPANY_CREATOR.to_string()),
            SourceKind::Task | SourceKind::Placeholder => None,
        };
        Self {
            id: item.id.clone(),
            title: item.label.clone(),
            start: item.start,
            end: item.end,
            kind: item.kind,
            created_by,
            assigned_to: None,
        }
    }

    pub fn with_assigned_to(mut self, assignee: impl Into<String>) -> Self {
        self.assigned_to = Some(assignee.into());
        self
    }

    pub fn with_created_by(mut self, creator: impl Into<String>) -> Self {
        self.created_by = Some(creator.into());
        self
    }

    fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        let (start, end) = (self.start.min(self.end), self.start.max(self.end));
        start <= to && end >= from
    }
}

/// Calendar rows for every real timeline item. The chart placeholder is
/// dropped since an empty calendar renders fine.
pub fn entries(items: &[TimelineItem]) -> Vec<CalendarEntry> {
    items
        .iter()
        .filter(|item| !item.is_placeholder())
        .map(CalendarEntry::from_item)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarMode {
    #[default]
    Month,
    Week,
    Day,
}

impl CalendarMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Month => "Mes",
            Self::Week => "Semana",
            Self::Day => "Día",
        }
    }
}

impl std::str::FromStr for CalendarMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "month" | "mes" => Ok(Self::Month),
            "week" | "semana" => Ok(Self::Week),
            "day" | "dia" | "día" => Ok(Self::Day),
            other => Err(format!("unknown calendar mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarView {
    mode: CalendarMode,
    cursor: NaiveDate,
    owner_view: bool,
}

impl CalendarView {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            mode: CalendarMode::Month,
            cursor: today,
            owner_view: true,
        }
    }

    pub fn mode(&self) -> CalendarMode {
        self.mode
    }

    pub fn cursor(&self) -> NaiveDate {
        self.cursor
    }

    pub fn is_owner_view(&self) -> bool {
        self.owner_view
    }

    pub fn set_mode(&mut self, mode: CalendarMode) {
        self.mode = mode;
    }

    pub fn navigate(&mut self, date: NaiveDate) {
        self.cursor = date;
    }

    pub fn today(&mut self, today: NaiveDate) {
        self.cursor = today;
    }

    pub fn toggle_view(&mut self) {
        self.owner_view = !self.owner_view;
    }

    pub fn next(&mut self) {
        self.cursor = self.step(true);
    }

    pub fn back(&mut self) {
        self.cursor = self.step(false);
    }

    // Month steps clamp to the last day of the target month (Jan 31 -> Feb 29).
    fn step(&self, forward: bool) -> NaiveDate {
        let stepped = match (self.mode, forward) {
            (CalendarMode::Month, true) => self.cursor.checked_add_months(Months::new(1)),
            (CalendarMode::Month, false) => self.cursor.checked_sub_months(Months::new(1)),
            (CalendarMode::Week, true) => self.cursor.checked_add_signed(Duration::days(7)),
            (CalendarMode::Week, false) => self.cursor.checked_sub_signed(Duration::days(7)),
            (CalendarMode::Day, true) => self.cursor.succ_opt(),
            (CalendarMode::Day, false) => self.cursor.pred_opt(),
        };
        stepped.unwrap_or(self.cursor)
    }

    pub fn title(&self) -> String {
        let audience = if self.owner_view {
            "Empresa"
        } else {
            "Trabajador"
        };
        format!("Calendario ({audience})")
    }

    /// Inclusive window shown for the current mode. Weeks start on Monday.
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        match self.mode {
            CalendarMode::Month => {
                let first = self.cursor.with_day(1).unwrap_or(self.cursor);
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(self.cursor);
                (first, last)
            }
            CalendarMode::Week => {
                let offset = i64::from(self.cursor.weekday().num_days_from_monday());
                let first = self.cursor - Duration::days(offset);
                (first, first + Duration::days(6))
            }
            CalendarMode::Day => (self.cursor, self.cursor),
        }
    }

    /// Owner view shows everything; worker view keeps company-created
    /// entries and entries whose assignee is the literal `"operario"`.
    pub fn passes_role_filter(&self, entry: &CalendarEntry) -> bool {
        // TODO: match the assignee against the signed-in operator once the
        // product owner confirms the intended worker-view semantics.
        self.owner_view
            || entry.created_by.as_deref() == Some(COMPANY_CREATOR)
            || entry.assigned_to.as_deref() == Some(OPERATOR_ASSIGNEE)
    }

    pub fn visible<'a>(&self, entries: &'a [CalendarEntry]) -> Vec<&'a CalendarEntry> {
        let (from, to) = self.range();
        let mut visible: Vec<&CalendarEntry> = entries
            .iter()
            .filter(|entry| self.passes_role_filter(entry))
            .filter(|entry| entry.overlaps(from, to))
            .collect();
        visible.sort_by_key(|entry| entry.start.min(entry.end));
        visible
    }
}

pub fn render_agenda(view: &CalendarView, entries: &[CalendarEntry]) -> String {
    let (from, to) = view.range();
    let mut out = String::new();
    let _ = writeln!(out, "{} · {} {from} – {to}", view.title(), view.mode().label());

    let visible = view.visible(entries);
    if visible.is_empty() {
        let _ = writeln!(out, "  {NO_EVENTS}");
        return out;
    }

    for entry in visible {
        let marker = if entry.end < entry.start { " !" } else { "" };
        let span = if entry.start == entry.end {
            entry.start.to_string()
        } else {
            format!("{} → {}", entry.start, entry.end)
        };
        let _ = writeln!(out, "  {span:<23} {}{marker}", entry.title);
    }
    out
}

#[cfg(test)]
#[path = "tests/calendar_tests.rs"]
mod tests;
