use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::snapshot::Snapshot;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "snapshotLoaded": state.snapshot.is_some()
        }),
    )
}

fn snapshot_summary(snapshot: &Snapshot) -> serde_json::Value {
    json!({
        "start": snapshot.period.start.format("%Y-%m-%d").to_string(),
        "finish": snapshot.period.finish.format("%Y-%m-%d").to_string(),
        "sessionCount": snapshot.sessions.len(),
        "visitCount": snapshot.visits.len()
    })
}

fn handle_snapshot_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    match Snapshot::from_params(&req.params) {
        Ok(snapshot) => {
            let summary = snapshot_summary(&snapshot);
            state.snapshot = Some(snapshot);
            ok(&req.id, summary)
        }
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_snapshot_load_file(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = path else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    match Snapshot::from_path(&path) {
        Ok(snapshot) => {
            let summary = snapshot_summary(&snapshot);
            state.snapshot = Some(snapshot);
            ok(&req.id, summary)
        }
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_snapshot_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.snapshot = None;
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "snapshot.load" => Some(handle_snapshot_load(state, req)),
        "snapshot.loadFile" => Some(handle_snapshot_load_file(state, req)),
        "snapshot.clear" => Some(handle_snapshot_clear(state, req)),
        _ => None,
    }
}
