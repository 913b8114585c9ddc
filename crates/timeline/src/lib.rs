//! Schedule projections shared by the calendar and Gantt views.
//!
//! Orders, tasks and events live in separate stores with different date
//! fields. [`normalize`] folds them into one [`TimelineItem`] sequence; the
//! [`calendar`] and [`gantt`] modules only ever consume that sequence.

pub mod calendar;
pub mod gantt;
mod normalize;

pub use normalize::{
    calendar_day, normalize, normalize_on, SourceKind, TimelineItem, PLACEHOLDER_ID,
    PLACEHOLDER_LABEL,
};
