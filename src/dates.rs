//! Calendar-date helpers (pure, no clock reads).
//!
//! Record dates are date-only values. They are parsed into `NaiveDate` and
//! never into instants, so month and range boundaries cannot shift with the
//! local timezone.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::types::MonthLocale;

const PT_BR_MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Parse a record date as a calendar date.
///
/// Accepts `YYYY-MM-DD`, optionally followed by a time component
/// (`2024-01-10T14:00:00Z`, `2024-01-10 14:00`), which is discarded.
/// Returns `None` for anything else.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = match value.get(..10) {
        Some(head) => {
            let rest = &value[10..];
            if rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ') {
                head
            } else {
                return None;
            }
        }
        None => return None,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Months since year 0, used to bucket dates without building intervals.
pub fn month_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// First days of the `len` months ending with the month of `today`, oldest
/// first.
///
/// Always returns `len` consecutive months. Near the earliest representable
/// date the window starts at that month and runs forward past `today`.
pub fn trailing_months(today: NaiveDate, len: usize) -> Vec<NaiveDate> {
    let back = Months::new(len.saturating_sub(1) as u32);
    let oldest = month_start(today)
        .checked_sub_months(back)
        .unwrap_or_else(|| month_start(NaiveDate::MIN));
    (0..len)
        .filter_map(|ahead| oldest.checked_add_months(Months::new(ahead as u32)))
        .collect()
}

/// Short month label: `jan`, `fev`, ... or `Jan`, `Feb`, ...
pub fn month_label(month: NaiveDate, locale: MonthLocale) -> String {
    match locale {
        MonthLocale::PtBr => PT_BR_MONTHS[month.month0() as usize]
            .chars()
            .take(3)
            .collect(),
        MonthLocale::En => month.format("%b").to_string(),
    }
}

/// Long month label: `janeiro 2024` or `January 2024`.
pub fn full_month_label(month: NaiveDate, locale: MonthLocale) -> String {
    match locale {
        MonthLocale::PtBr => format!("{} {}", PT_BR_MONTHS[month.month0() as usize], month.year()),
        MonthLocale::En => month.format("%B %Y").to_string(),
    }
}
