use crate::engine::{classify_day, date_range, DayCell, WeekdayIndex};
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

/// `now` comes from the request when the shell wants deterministic rendering;
/// otherwise the local wall clock.
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

fn day_cell_json(cell: &DayCell) -> serde_json::Value {
    let sessions: Vec<serde_json::Value> = cell
        .sessions
        .iter()
        .map(|d| {
            json!({
                "sessionId": d.session_id,
                "discipline": d.discipline,
                "teacher": d.teacher,
                "location": d.location,
                "timeStart": d.time_start,
                "timeFinish": d.time_finish,
                "visited": d.visited
            })
        })
        .collect();
    json!({
        "date": cell.date.format("%Y-%m-%d").to_string(),
        "status": cell.status.as_str(),
        "sessions": sessions
    })
}

fn calendar_open(
    snapshot: &Snapshot,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let now = resolve_now(params)?;

    let days = date_range(snapshot.period.start, snapshot.period.finish);
    let index = WeekdayIndex::build(&snapshot.sessions);
    let visits = snapshot.visits_for_student(&student_id);

    let rows: Vec<serde_json::Value> = days
        .iter()
        .map(|d| day_cell_json(&classify_day(*d, index.for_date(*d), &visits, now)))
        .collect();

    Ok(json!({
        "studentId": student_id,
        "start": snapshot.period.start.format("%Y-%m-%d").to_string(),
        "finish": snapshot.period.finish.format("%Y-%m-%d").to_string(),
        "days": rows
    }))
}

fn handle_calendar_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(snapshot) = state.snapshot.as_ref() else {
        return err(&req.id, "no_snapshot", "load a snapshot first", None);
    };
    match calendar_open(snapshot, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calendar.open" => Some(handle_calendar_open(state, req)),
        _ => None,
    }
}
