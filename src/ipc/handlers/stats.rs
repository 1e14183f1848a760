use crate::engine::{date_range, expected_count, visit_totals, visits_by_student};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::parse_datetime;
use crate::snapshot::Snapshot;
use chrono::NaiveDateTime;
use serde_json::json;

struct HandlerErr {
    code: &'static str,
    message: String,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, None)
    }
}

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: format!("missing {}", key),
        })
}

fn resolve_now(params: &serde_json::Value) -> Result<NaiveDateTime, HandlerErr> {
    match params.get("now") {
        None => Ok(chrono::Local::now().naive_local()),
        Some(v) if v.is_null() => Ok(chrono::Local::now().naive_local()),
        Some(v) => {
            let Some(raw) = v.as_str() else {
                return Err(HandlerErr {
                    code: "bad_params",
                    message: "now must be an ISO datetime string".to_string(),
                });
            };
            parse_datetime(raw).ok_or_else(|| HandlerErr {
                code: "bad_params",
                message: format!("now: bad datetime '{}'", raw),
            })
        }
    }
}

/// Plan-vs-fact pie for one student: expected slots over the enrollment
/// range against recorded visits.
fn stats_personal(
    snapshot: &Snapshot,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let now = resolve_now(params)?;

    let days = date_range(snapshot.period.start, snapshot.period.finish);
    let visited = snapshot.visit_count_for_student(&student_id);
    let totals = visit_totals(&snapshot.sessions, &days, visited, now);

    Ok(json!({
        "studentId": student_id,
        "expected": totals.expected,
        "visited": totals.visited,
        "absent": totals.absent,
        "future": totals.future
    }))
}

/// Per-student visit counts for the group bar chart, plus the shared
/// expected-slot count as the reference line. Unlike the personal pie this
/// has no `now` dependency: the bars show recorded visits only.
fn stats_group(snapshot: &Snapshot) -> Result<serde_json::Value, HandlerErr> {
    let days = date_range(snapshot.period.start, snapshot.period.finish);
    let expected = expected_count(&snapshot.sessions, &days);
    let per_student: Vec<serde_json::Value> = visits_by_student(&snapshot.visits)
        .into_iter()
        .map(|(student_id, visits)| {
            json!({
                "studentId": student_id,
                "visits": visits
            })
        })
        .collect();

    Ok(json!({
        "expected": expected,
        "perStudent": per_student
    }))
}

fn handle_stats_personal(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(snapshot) = state.snapshot.as_ref() else {
        return err(&req.id, "no_snapshot", "load a snapshot first", None);
    };
    match stats_personal(snapshot, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_stats_group(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(snapshot) = state.snapshot.as_ref() else {
        return err(&req.id, "no_snapshot", "load a snapshot first", None);
    };
    match stats_group(snapshot) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.personal" => Some(handle_stats_personal(state, req)),
        "stats.group" => Some(handle_stats_group(state, req)),
        _ => None,
    }
}
