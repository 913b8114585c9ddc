use shared::domain::{Order, OrderId};

use super::*;
use crate::normalize::{normalize_on, PLACEHOLDER_ID};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn order(id: i64, product: &str, expected: &str, delivered: Option<&str>) -> Order {
    Order {
        id: OrderId(id),
        client_id: None,
        status: None,
        product_type: product.to_string(),
        quantity: None,
        expected_date: Some(expected.to_string()),
        delivered_date: delivered.map(str::to_string),
        logistics: None,
    }
}

#[test]
fn dataset_is_never_empty() {
    let items = normalize_on(day(2024, 1, 1), &[], &[], &[]);
    let chart = GanttChart::new(&items);

    let json: serde_json::Value =
        serde_json::from_str(&chart.dataset_json().expect("json")).expect("parse");
    let rows = json.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], PLACEHOLDER_ID);
    assert_eq!(rows[0]["start"], "2024-01-01");
}

#[test]
fn default_options_use_day_view() {
    let items = normalize_on(day(2024, 1, 1), &[], &[], &[]);
    let chart = GanttChart::new(&items);
    assert_eq!(chart.options().view_mode, ViewMode::Day);
    assert_eq!(chart.options().date_format, "YYYY-MM-DD");
}

#[test]
fn bounds_cover_inverted_rows() {
    let items = normalize_on(
        day(2024, 1, 1),
        &[
            order(1, "A", "2024-01-05", Some("2024-01-07")),
            order(2, "B", "2024-01-10", Some("2024-01-02")),
        ],
        &[],
        &[],
    );
    let chart = GanttChart::new(&items);
    assert_eq!(chart.bounds(), Some((day(2024, 1, 2), day(2024, 1, 10))));
}

#[test]
fn renders_day_columns_per_row() {
    let items = normalize_on(
        day(2024, 1, 1),
        &[
            order(1, "A", "2024-01-01", Some("2024-01-03")),
            order(2, "B", "2024-01-04", None),
        ],
        &[],
        &[],
    );
    let text = GanttChart::new(&items).render_text(80);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("2024-01-01 → 2024-01-04"));
    assert!(lines[1].starts_with("Pedido: A"));
    assert!(lines[1].ends_with("███·"));
    assert!(lines[2].ends_with("···█"));
}

#[test]
fn inverted_rows_are_marked() {
    let items = normalize_on(
        day(2024, 1, 1),
        &[order(1, "A", "2024-01-03", Some("2024-01-01"))],
        &[],
        &[],
    );
    let text = GanttChart::new(&items).render_text(80);
    assert!(text.lines().nth(1).expect("row").ends_with("███ !"));
}

#[test]
fn week_mode_buckets_days() {
    let items = normalize_on(
        day(2024, 1, 1),
        &[order(1, "A", "2024-01-01", Some("2024-01-20"))],
        &[],
        &[],
    );
    let chart = GanttChart::new(&items).with_options(GanttOptions {
        view_mode: ViewMode::Week,
        ..GanttOptions::default()
    });
    let text = chart.render_text(80);
    assert!(text.lines().nth(1).expect("row").ends_with("███"));
}

#[test]
fn column_count_is_capped() {
    let items = normalize_on(
        day(2024, 1, 1),
        &[order(1, "A", "2024-01-01", Some("2024-12-31"))],
        &[],
        &[],
    );
    let text = GanttChart::new(&items).render_text(10);
    let row = text.lines().nth(1).expect("row");
    assert_eq!(row.chars().filter(|c| *c == '█').count(), 10);
}

#[test]
fn popup_escapes_label() {
    let items = normalize_on(
        day(2024, 1, 1),
        &[order(1, "<Larvas & Co>", "2024-02-01", Some("2024-02-05"))],
        &[],
        &[],
    );
    assert_eq!(
        popup_html(&items[0]),
        "<div class=\"gantt-task-info\"><strong>Pedido: &lt;Larvas &amp; Co&gt;</strong><br/><small>2024-02-01 → 2024-02-05</small></div>"
    );
}

#[test]
fn long_labels_are_truncated() {
    let label = "x".repeat(40);
    let cut = truncate(&label, 10);
    assert_eq!(cut.chars().count(), 10);
    assert!(cut.ends_with('…'));
}
