use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

use crate::model::{Session, VisitEvent};

/// Per-day attendance classification, derived on every query and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    Visited,
    PartiallyVisited,
    Absent,
    Future,
    NoClass,
}

impl DayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DayStatus::Visited => "visited",
            DayStatus::PartiallyVisited => "partiallyVisited",
            DayStatus::Absent => "absent",
            DayStatus::Future => "future",
            DayStatus::NoClass => "noClass",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionDetail {
    pub session_id: String,
    pub discipline: Option<String>,
    pub teacher: Option<String>,
    pub location: Option<String>,
    pub time_start: String,
    pub time_finish: String,
    pub visited: bool,
}

#[derive(Debug, Clone)]
pub struct DayCell {
    pub date: NaiveDate,
    pub status: DayStatus,
    pub sessions: Vec<SessionDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitTotals {
    pub expected: u32,
    pub visited: u32,
    pub absent: u32,
    pub future: u32,
}

/// Every calendar date from `start` to `finish` inclusive, ascending.
/// Empty when `start > finish`.
pub fn date_range(start: NaiveDate, finish: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut d = start;
    while d <= finish {
        days.push(d);
        match d.succ_opt() {
            Some(next) => d = next,
            None => break,
        }
    }
    days
}

fn weekday_slot(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

/// Sessions bucketed by stored weekday (0 = Monday .. 6 = Sunday).
/// Rows with an out-of-range day are kept in the snapshot but never
/// reachable through the index.
pub struct WeekdayIndex<'a> {
    buckets: [Vec<&'a Session>; 7],
}

impl<'a> WeekdayIndex<'a> {
    pub fn build(sessions: &'a [Session]) -> WeekdayIndex<'a> {
        let mut buckets: [Vec<&'a Session>; 7] = Default::default();
        for s in sessions {
            if let Some(bucket) = buckets.get_mut(s.day as usize) {
                bucket.push(s);
            }
        }
        WeekdayIndex { buckets }
    }

    pub fn on_weekday(&self, day: u8) -> &[&'a Session] {
        self.buckets
            .get(day as usize)
            .map(|b| b.as_slice())
            .unwrap_or(&[])
    }

    pub fn for_date(&self, date: NaiveDate) -> &[&'a Session] {
        &self.buckets[weekday_slot(date)]
    }

    pub fn has_class(&self, date: NaiveDate) -> bool {
        !self.for_date(date).is_empty()
    }
}

/// Clock strings compare as zero-padded digit strings ("08:15:00" -> "081500").
/// Recorded visits were matched this way upstream; keep the comparison
/// byte-for-byte, strict at both ends.
pub fn time_key(t: &str) -> String {
    t.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn session_visited(session: &Session, day_visits: &[&VisitEvent]) -> bool {
    let start = time_key(&session.time_start);
    let finish = time_key(&session.time_finish);
    day_visits.iter().any(|v| {
        let t = v.date.format("%H%M%S").to_string();
        t > start && t < finish
    })
}

fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Classify one calendar day. `sessions` are the sessions whose weekday
/// matches `date`; `visits` may span the whole range and are filtered here.
pub fn classify_day(
    date: NaiveDate,
    sessions: &[&Session],
    visits: &[&VisitEvent],
    now: NaiveDateTime,
) -> DayCell {
    let day_visits: Vec<&VisitEvent> = visits
        .iter()
        .filter(|v| v.date.date() == date)
        .copied()
        .collect();

    let status = if !day_visits.is_empty() {
        if day_visits.len() == sessions.len() {
            DayStatus::Visited
        } else {
            DayStatus::PartiallyVisited
        }
    } else if !sessions.is_empty() && day_start(date) < now {
        DayStatus::Absent
    } else if !sessions.is_empty() && day_start(date) > now {
        DayStatus::Future
    } else {
        DayStatus::NoClass
    };

    // Per-session detail is only rendered on attended days.
    let details = match status {
        DayStatus::Visited | DayStatus::PartiallyVisited => sessions
            .iter()
            .map(|s| SessionDetail {
                session_id: s.id.clone(),
                discipline: s.discipline.clone(),
                teacher: s.teacher.clone(),
                location: s.location.clone(),
                time_start: s.time_start.clone(),
                time_finish: s.time_finish.clone(),
                visited: session_visited(s, &day_visits),
            })
            .collect(),
        _ => Vec::new(),
    };

    DayCell {
        date,
        status,
        sessions: details,
    }
}

/// Expected slot count over the range: each session contributes one count per
/// calendar day on its weekday. Two sessions sharing a weekday both count —
/// a session is a slot, not a day.
pub fn expected_count(sessions: &[Session], days: &[NaiveDate]) -> u32 {
    sessions
        .iter()
        .map(|s| {
            days.iter()
                .filter(|d| weekday_slot(**d) == s.day as usize)
                .count() as u32
        })
        .sum()
}

/// Plan-vs-fact totals for the statistics pie. `visited` is the number of
/// recorded visit events. Absent is past slots minus visits, clamped at zero;
/// future is the remainder, clamped likewise.
pub fn visit_totals(
    sessions: &[Session],
    days: &[NaiveDate],
    visited: u32,
    now: NaiveDateTime,
) -> VisitTotals {
    let expected = expected_count(sessions, days);
    let past_slots: u32 = sessions
        .iter()
        .map(|s| {
            days.iter()
                .filter(|d| weekday_slot(**d) == s.day as usize && day_start(**d) < now)
                .count() as u32
        })
        .sum();
    let absent = past_slots.saturating_sub(visited);
    let future = expected.saturating_sub(absent + visited);
    VisitTotals {
        expected,
        visited,
        absent,
        future,
    }
}

/// Visit counts per student, ordered by student id for stable bar charts.
pub fn visits_by_student(visits: &[VisitEvent]) -> Vec<(String, u32)> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for v in visits {
        *counts.entry(v.student_id.clone()).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}
