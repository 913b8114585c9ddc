//! Gantt view: the chart widget's dataset and options, its popup markup, and
//! a plain-text renderer for terminals.

use std::fmt::Write as _;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::normalize::TimelineItem;

pub const DATE_FORMAT: &str = "YYYY-MM-DD";

const BAR: char = '█';
const GAP: char = '·';
const LABEL_WIDTH: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ViewMode {
    #[default]
    Day,
    Week,
    Month,
}

impl ViewMode {
    fn days_per_column(self) -> i64 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!("unknown gantt view mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GanttOptions {
    pub view_mode: ViewMode,
    pub date_format: &'static str,
}

impl Default for GanttOptions {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Day,
            date_format: DATE_FORMAT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GanttChart<'a> {
    items: &'a [TimelineItem],
    options: GanttOptions,
}

impl<'a> GanttChart<'a> {
    /// `items` comes from the normalizer and is therefore never empty.
    pub fn new(items: &'a [TimelineItem]) -> Self {
        Self {
            items,
            options: GanttOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GanttOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &GanttOptions {
        &self.options
    }

    pub fn dataset_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self.items)
    }

    /// Inclusive date range covered by every row, inverted rows included.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut spans = self.items.iter().map(TimelineItem::span);
        let first = spans.next()?;
        Some(spans.fold(first, |(lo, hi), (start, end)| (lo.min(start), hi.max(end))))
    }

    /// One line per row: label, then one column per `view_mode` bucket, with
    /// at most `max_columns` columns. Inverted rows end with `!`.
    pub fn render_text(&self, max_columns: usize) -> String {
        let mut out = String::new();
        let Some((from, to)) = self.bounds() else {
            return out;
        };

        let per_column = self.options.view_mode.days_per_column();
        let total_days = (to - from).num_days() + 1;
        let needed = usize::try_from((total_days + per_column - 1) / per_column).unwrap_or(1);
        let columns = needed.clamp(1, max_columns.max(1));

        let _ = writeln!(out, "{:<LABEL_WIDTH$} {from} → {to}", "");
        for item in self.items {
            let (start, end) = item.span();
            let bar: String = (0..columns)
                .map(|column| {
                    let offset = i64::try_from(column).unwrap_or(i64::MAX) * per_column;
                    let bucket_start = from + Duration::days(offset);
                    let bucket_end = bucket_start + Duration::days(per_column - 1);
                    if start <= bucket_end && end >= bucket_start {
                        BAR
                    } else {
                        GAP
                    }
                })
                .collect();
            let marker = if item.is_inverted() { " !" } else { "" };
            let _ = writeln!(
                out,
                "{:<LABEL_WIDTH$} {bar}{marker}",
                truncate(&item.label, LABEL_WIDTH)
            );
        }
        out
    }
}

pub fn popup_html(item: &TimelineItem) -> String {
    format!(
        "<div class=\"gantt-task-info\"><strong>{}</strong><br/><small>{} → {}</small></div>",
        escape_html(&item.label),
        item.start,
        item.end
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn truncate(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        return label.to_string();
    }
    let mut cut: String = label.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
#[path = "tests/gantt_tests.rs"]
mod tests;
