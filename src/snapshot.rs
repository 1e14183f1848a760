use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::model::{
    parse_date, parse_datetime, EnrollmentPeriod, GroupPeriodRow, Session, SessionRow, VisitEvent,
    VisitRow,
};

/// One loaded (group, discipline) context: the enrollment period, the weekly
/// sessions and every known visit event. Built once per `snapshot.load` and
/// read-only afterwards; queries are pure functions over it.
#[derive(Debug)]
pub struct Snapshot {
    pub period: EnrollmentPeriod,
    pub sessions: Vec<Session>,
    pub visits: Vec<VisitEvent>,
}

#[derive(Debug)]
pub struct LoadError {
    pub code: &'static str,
    pub message: String,
}

impl LoadError {
    fn bad_params(message: impl Into<String>) -> LoadError {
        LoadError {
            code: "bad_params",
            message: message.into(),
        }
    }
}

impl Snapshot {
    /// Build a snapshot from an inline IPC payload:
    /// `{ group?: {start, finish}, sessions: [...], visits?: [...] }`.
    /// When the top-level group is absent, the period is taken from the
    /// first session row's embedded `group` (the REST schedule payload
    /// nests it inside each session).
    pub fn from_params(params: &Value) -> Result<Snapshot, LoadError> {
        let sessions_raw = params
            .get("sessions")
            .cloned()
            .ok_or_else(|| LoadError::bad_params("missing sessions"))?;
        let rows: Vec<SessionRow> = serde_json::from_value(sessions_raw)
            .map_err(|e| LoadError::bad_params(format!("sessions: {}", e)))?;

        let period_row: GroupPeriodRow = match params.get("group") {
            Some(v) if !v.is_null() => serde_json::from_value(v.clone())
                .map_err(|e| LoadError::bad_params(format!("group: {}", e)))?,
            _ => rows
                .iter()
                .find_map(|r| r.group.clone())
                .ok_or_else(|| LoadError::bad_params("missing group period"))?,
        };
        let period = parse_period(&period_row)?;

        let visits = match params.get("visits") {
            Some(v) if !v.is_null() => {
                let rows: Vec<VisitRow> = serde_json::from_value(v.clone())
                    .map_err(|e| LoadError::bad_params(format!("visits: {}", e)))?;
                parse_visits(rows)?
            }
            _ => Vec::new(),
        };

        Ok(Snapshot {
            period,
            sessions: rows.into_iter().map(Session::from_row).collect(),
            visits,
        })
    }

    /// Load the same document from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Snapshot, LoadError> {
        let doc = read_json(path).map_err(|e| LoadError {
            code: "snapshot_open_failed",
            message: format!("{:#}", e),
        })?;
        Snapshot::from_params(&doc)
    }

    pub fn visits_for_student<'a>(&'a self, student_id: &str) -> Vec<&'a VisitEvent> {
        self.visits
            .iter()
            .filter(|v| v.student_id == student_id)
            .collect()
    }

    pub fn visit_count_for_student(&self, student_id: &str) -> u32 {
        self.visits
            .iter()
            .filter(|v| v.student_id == student_id)
            .count() as u32
    }
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let doc = serde_json::from_str(&raw)
        .with_context(|| format!("parse {}", path.display()))?;
    Ok(doc)
}

fn parse_period(row: &GroupPeriodRow) -> Result<EnrollmentPeriod, LoadError> {
    let start = parse_date(&row.start)
        .ok_or_else(|| LoadError::bad_params(format!("group.start: bad date '{}'", row.start)))?;
    let finish = parse_date(&row.finish)
        .ok_or_else(|| LoadError::bad_params(format!("group.finish: bad date '{}'", row.finish)))?;
    Ok(EnrollmentPeriod { start, finish })
}

fn parse_visits(rows: Vec<VisitRow>) -> Result<Vec<VisitEvent>, LoadError> {
    rows.into_iter()
        .map(|r| {
            let date = parse_datetime(&r.date).ok_or_else(|| {
                LoadError::bad_params(format!("visit {}: bad date '{}'", r.id, r.date))
            })?;
            Ok(VisitEvent {
                id: r.id,
                student_id: r.student_id,
                schedule_id: r.schedule_id,
                date,
            })
        })
        .collect()
}
