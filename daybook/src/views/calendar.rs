//! Calendar view
//!
//! Buckets live entries into the days of a selected month. Day membership
//! is decided in one timezone passed by the caller, so an entry written at
//! 23:59 and one at 00:01 land on their own (distinct) days regardless of
//! how the store serialized the instant.

use chrono::{Datelike, NaiveDate, TimeZone};
use serde::Serialize;

use super::list::EntryCard;
use crate::model::Entry;

/// Grid for one month: a Sunday-first layout with leading blanks before
/// the first day, mirroring the weekday header row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Cells to skip before day 1 (weekday offset from Sunday).
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub day: u32,
    pub entry_count: usize,
    pub is_today: bool,
}

/// Project the entry array into the grid for `year`/`month`. `today` is
/// the caller's current local date (kept explicit so the projection stays
/// a pure function).
pub fn month_grid<Tz: TimeZone>(
    entries: &[Entry],
    year: i32,
    month: u32,
    today: NaiveDate,
    tz: &Tz,
) -> CalendarMonth {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return CalendarMonth {
            year,
            month,
            leading_blanks: 0,
            days: Vec::new(),
        };
    };

    let local_dates: Vec<NaiveDate> = entries
        .iter()
        .filter(|entry| !entry.deleted)
        .map(|entry| entry.date.with_timezone(tz).date_naive())
        .collect();

    let mut days = Vec::new();
    for day in 1..=31 {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            break;
        };
        days.push(CalendarDay {
            day,
            entry_count: local_dates.iter().filter(|d| **d == date).count(),
            is_today: date == today,
        });
    }

    CalendarMonth {
        year,
        month,
        leading_blanks: first.weekday().num_days_from_sunday(),
        days,
    }
}

/// Entries of one selected day, newest first — the drill-down shown when
/// a marked day is clicked.
pub fn day_entries<Tz: TimeZone>(entries: &[Entry], date: NaiveDate, tz: &Tz) -> Vec<EntryCard> {
    let mut matching: Vec<&Entry> = entries
        .iter()
        .filter(|entry| !entry.deleted)
        .filter(|entry| entry.date.with_timezone(tz).date_naive() == date)
        .collect();
    matching.sort_by(|a, b| b.date.cmp(&a.date));
    matching.into_iter().map(EntryCard::from_entry).collect()
}
