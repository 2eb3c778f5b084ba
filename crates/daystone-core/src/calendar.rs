use crate::task::{is_active_on, TaskBook};
use crate::types::TaskId;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// MonthGrid
// ---------------------------------------------------------------------------

/// One month laid out in Sunday-first calendar rows, plus an index of which
/// tasks fall on each day. Rebuilt on every cursor move; cheap enough that no
/// caching is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    /// Rows of day numbers, `None` for the leading/trailing blanks that pad
    /// each row to seven cells.
    pub weeks: Vec<[Option<u32>; 7]>,
    pub day_tasks: BTreeMap<u32, Vec<TaskId>>,
}

impl MonthGrid {
    pub fn tasks_on(&self, day: u32) -> &[TaskId] {
        self.day_tasks.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Build the grid for `(year, month)` by evaluating every task against every
/// day of the month. Pure; an out-of-range month yields an empty grid.
pub fn build_month(year: i32, month: u32, tasks: &TaskBook) -> MonthGrid {
    let days = days_in_month(year, month);
    let lead = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.weekday().num_days_from_sunday() as usize)
        .unwrap_or(0);

    let mut cells: Vec<Option<u32>> = vec![None; lead];
    cells.extend((1..=days).map(Some));
    while cells.len() % 7 != 0 {
        cells.push(None);
    }
    let weeks = cells
        .chunks(7)
        .map(|chunk| {
            let mut row = [None; 7];
            row.copy_from_slice(chunk);
            row
        })
        .collect();

    let mut day_tasks: BTreeMap<u32, Vec<TaskId>> = BTreeMap::new();
    for day in 1..=days {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };
        for task in tasks.iter() {
            if is_active_on(task, date) {
                day_tasks.entry(day).or_default().push(task.id);
            }
        }
    }

    MonthGrid { year, month, weeks, day_tasks }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Cursor helpers
// ---------------------------------------------------------------------------

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
