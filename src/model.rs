use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// A recurring weekly class slot as the REST schedule endpoint serves it.
/// `day` is 0 = Monday .. 6 = Sunday. Times stay as zero-padded "HH:MM:SS"
/// strings; visit matching compares them as strings (see engine::time_key).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub id: String,
    pub day: u8,
    pub time_start: String,
    pub time_finish: String,
    #[serde(default)]
    pub discipline: Option<String>,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub group: Option<GroupPeriodRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRow {
    pub id: String,
    pub student_id: String,
    pub schedule_id: String,
    pub date: String,
}

/// Enrollment interval as the REST payload nests it inside each session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPeriodRow {
    pub start: String,
    pub finish: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub day: u8,
    pub time_start: String,
    pub time_finish: String,
    pub discipline: Option<String>,
    pub teacher: Option<String>,
    pub location: Option<String>,
}

impl Session {
    pub fn from_row(row: SessionRow) -> Session {
        Session {
            id: row.id,
            day: row.day,
            time_start: row.time_start,
            time_finish: row.time_finish,
            discipline: row.discipline,
            teacher: row.teacher,
            location: row.location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisitEvent {
    pub id: String,
    pub student_id: String,
    pub schedule_id: String,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentPeriod {
    pub start: NaiveDate,
    pub finish: NaiveDate,
}

/// Parse the date part of an ISO string ("YYYY-MM-DD", optionally followed
/// by a time component which is ignored).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    let head = t.get(..10).unwrap_or(t);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Parse an ISO datetime. Accepts 'T' or space separators, a trailing 'Z',
/// and fractional seconds (truncated). A bare date parses as midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let t = raw.trim().trim_end_matches('Z');
    let t = t.split('.').next().unwrap_or(t);
    NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| parse_date(t).and_then(|d| d.and_hms_opt(0, 0, 0)))
}
