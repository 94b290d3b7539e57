//! Relative time phrases resolved to absolute windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::intent::{contains_phrase, Intent};

/// A relative period the question can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisSemester,
}

// Longer phrases first so "last week" is not read as "week".
const LEXICON: &[(Period, &[&str])] = &[
    (Period::Yesterday, &["yesterday"]),
    (Period::Today, &["today", "tonight"]),
    (Period::LastWeek, &["last week", "past week", "previous week"]),
    (Period::ThisWeek, &["this week", "current week"]),
    (Period::LastMonth, &["last month", "past month", "previous month"]),
    (Period::ThisMonth, &["this month", "current month"]),
    (
        Period::ThisSemester,
        &["this semester", "this sem", "current semester", "semester", "this term"],
    ),
];

impl Period {
    /// Finds the first period named in an already normalized question.
    pub fn extract(normalized: &str) -> Option<Period> {
        LEXICON
            .iter()
            .find(|(_, phrases)| phrases.iter().any(|p| contains_phrase(normalized, p)))
            .map(|(period, _)| *period)
    }

    /// Window applied when the question names none.
    pub fn default_for(intent: Intent) -> Option<Period> {
        match intent {
            Intent::Attendance => Some(Period::ThisMonth),
            Intent::Excuse => Some(Period::ThisSemester),
            _ => None,
        }
    }

    /// Resolves the period to a half-open UTC window around `now`.
    ///
    /// Weeks start on Monday. Semesters run August to December, January
    /// to May, with June and July as the midyear term.
    pub fn resolve(self, now: DateTime<Utc>) -> TimeWindow {
        let today = now.date_naive();
        let (start, end) = match self {
            Period::Today => (today, today + Duration::days(1)),
            Period::Yesterday => (today - Duration::days(1), today),
            Period::ThisWeek => {
                let monday = week_start(today);
                (monday, monday + Duration::days(7))
            }
            Period::LastWeek => {
                let monday = week_start(today) - Duration::days(7);
                (monday, monday + Duration::days(7))
            }
            Period::ThisMonth => (month_start(today), next_month_start(today)),
            Period::LastMonth => {
                let this_month = month_start(today);
                (prev_month_start(this_month), this_month)
            }
            Period::ThisSemester => semester_bounds(today),
        };
        TimeWindow {
            period: self,
            start: midnight(start),
            end: midnight(end),
        }
    }
}

/// Absolute window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub period: Period,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&NaiveDateTime::new(date, NaiveTime::MIN))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn next_month_start(date: NaiveDate) -> NaiveDate {
    month_start(month_start(date) + Duration::days(32))
}

fn prev_month_start(date: NaiveDate) -> NaiveDate {
    month_start(month_start(date) - Duration::days(1))
}

fn semester_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let (first_month, months_long) = match today.month() {
        8..=12 => (8, 5),
        1..=5 => (1, 5),
        _ => (6, 2),
    };
    let mut start = month_start(today);
    for _ in first_month..today.month() {
        start = prev_month_start(start);
    }
    let mut end = start;
    for _ in 0..months_long {
        end = next_month_start(end);
    }
    (start, end)
}
