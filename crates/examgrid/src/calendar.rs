//! Calendar model: the window of exam days, the holiday set, the exam overlay
//! and the day cells derived from them.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::types::ScheduledExam;

/// Longest window the calendar will render
pub const MAX_DAYS: u32 = 366;

/// The run of consecutive days shown in both grids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub num_days: u32,
    pub start_date: NaiveDate,
}

impl ScheduleWindow {
    /// Resolve a window from raw form fields.
    ///
    /// An unparseable day count yields an empty window, a count above
    /// [`MAX_DAYS`] is capped, and an unparseable start date falls back to
    /// `fallback` (normally today).
    pub fn resolve(num_days: &str, start_date: &str, fallback: NaiveDate) -> Self {
        let num_days = num_days.trim().parse::<u32>().unwrap_or(0).min(MAX_DAYS);
        let start_date =
            NaiveDate::parse_from_str(start_date.trim(), "%Y-%m-%d").unwrap_or(fallback);
        Self {
            num_days,
            start_date,
        }
    }

    /// Date of the day at `index`, or `None` past the end of the calendar
    pub fn date_of(&self, index: u32) -> Option<NaiveDate> {
        self.start_date
            .checked_add_signed(Duration::days(i64::from(index)))
    }
}

/// Short weekday plus day/month, e.g. `Mon 01/01`
pub fn day_label(date: NaiveDate) -> String {
    date.format("%a %d/%m").to_string()
}

/// Day-indices the user marked as non-exam days
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HolidaySet(BTreeSet<u32>);

impl HolidaySet {
    /// Flip membership of `index`. Returns true if the day is now a holiday.
    pub fn toggle(&mut self, index: u32) -> bool {
        if self.0.remove(&index) {
            false
        } else {
            self.0.insert(index);
            true
        }
    }

    pub fn contains(&self, index: u32) -> bool {
        self.0.contains(&index)
    }

    /// Indices in ascending order, each at most once
    pub fn to_vec(&self) -> Vec<u32> {
        self.0.iter().copied().collect()
    }

    /// Drop every index outside `0..num_days`
    pub fn retain_below(&mut self, num_days: u32) {
        self.0.retain(|&i| i < num_days);
    }
}

impl FromIterator<u32> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Subjects scheduled per day, newline-joined in the order the scheduler
/// returned them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExamOverlay(BTreeMap<u32, String>);

impl ExamOverlay {
    pub fn from_schedule(schedule: &[ScheduledExam]) -> Self {
        let mut overlay = BTreeMap::new();
        for exam in schedule {
            let text: &mut String = overlay.entry(exam.day).or_default();
            text.push_str(&exam.subject);
            text.push('\n');
        }
        Self(overlay)
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    pub fn retain_below(&mut self, num_days: u32) {
        self.0.retain(|&i, _| i < num_days);
    }
}

/// One rendered day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub index: u32,
    pub date: NaiveDate,
    pub label: String,
    pub is_holiday: bool,
    pub exam_text: Option<String>,
}

impl DayCell {
    pub fn has_exam(&self) -> bool {
        self.exam_text.is_some()
    }

    /// Subject names on this day, in scheduler order
    pub fn subjects(&self) -> Vec<&str> {
        self.exam_text
            .as_deref()
            .map(|t| t.lines().filter(|l| !l.is_empty()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for DayCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:>2})", self.label, self.index + 1)?;
        if self.is_holiday {
            write!(f, "  [holiday]")?;
        }
        let subjects = self.subjects();
        if !subjects.is_empty() {
            write!(f, "  {}", subjects.join(", "))?;
        }
        Ok(())
    }
}

/// The editable input grid and the read-only result grid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CalendarGrids {
    pub input: Vec<DayCell>,
    pub result: Vec<DayCell>,
}

/// Build both grids from scratch.
///
/// Holiday and overlay indices outside the window are ignored.
pub fn build_grids(
    window: &ScheduleWindow,
    holidays: &HolidaySet,
    overlay: &ExamOverlay,
) -> CalendarGrids {
    let mut grids = CalendarGrids::default();

    for index in 0..window.num_days {
        let Some(date) = window.date_of(index) else {
            break;
        };
        let cell = DayCell {
            index,
            date,
            label: day_label(date),
            is_holiday: holidays.contains(index),
            exam_text: None,
        };
        let result = DayCell {
            exam_text: overlay.get(index).map(str::to_string),
            ..cell.clone()
        };
        grids.input.push(cell);
        grids.result.push(result);
    }

    grids
}
