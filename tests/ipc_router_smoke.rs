use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_attendanced");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn attendanced");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn error_code(resp: &serde_json::Value) -> Option<&str> {
    resp.get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

fn snapshot_doc() -> serde_json::Value {
    json!({
        "group": { "start": "2024-01-01", "finish": "2024-01-07" },
        "sessions": [
            {
                "id": "s1",
                "day": 0,
                "timeStart": "08:00:00",
                "timeFinish": "09:30:00",
                "discipline": "Calculus",
                "teacher": "Ivanova",
                "location": "Main 214"
            }
        ],
        "visits": [
            {
                "id": "v1",
                "studentId": "stu-1",
                "scheduleId": "s1",
                "date": "2024-01-01T08:15:00"
            }
        ]
    })
}

#[test]
fn router_dispatch_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], json!(true));
    assert_eq!(health["result"]["snapshotLoaded"], json!(false));

    // Queries before any snapshot answer no_snapshot.
    let early = request(
        &mut stdin,
        &mut reader,
        "2",
        "calendar.open",
        json!({ "studentId": "stu-1" }),
    );
    assert_eq!(error_code(&early), Some("no_snapshot"));

    let loaded = request(&mut stdin, &mut reader, "3", "snapshot.load", snapshot_doc());
    assert_eq!(loaded["ok"], json!(true));
    assert_eq!(loaded["result"]["sessionCount"], json!(1));
    assert_eq!(loaded["result"]["visitCount"], json!(1));

    let health = request(&mut stdin, &mut reader, "4", "health", json!({}));
    assert_eq!(health["result"]["snapshotLoaded"], json!(true));

    let calendar = request(
        &mut stdin,
        &mut reader,
        "5",
        "calendar.open",
        json!({ "studentId": "stu-1", "now": "2024-01-10T12:00:00" }),
    );
    assert_eq!(calendar["ok"], json!(true));
    assert_eq!(
        calendar["result"]["days"].as_array().map(|a| a.len()),
        Some(7)
    );

    let personal = request(
        &mut stdin,
        &mut reader,
        "6",
        "stats.personal",
        json!({ "studentId": "stu-1", "now": "2024-01-10T12:00:00" }),
    );
    assert_eq!(personal["ok"], json!(true));

    let group = request(&mut stdin, &mut reader, "7", "stats.group", json!({}));
    assert_eq!(group["ok"], json!(true));

    let unknown = request(&mut stdin, &mut reader, "8", "schedule.refetch", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    let cleared = request(&mut stdin, &mut reader, "9", "snapshot.clear", json!({}));
    assert_eq!(cleared["ok"], json!(true));
    let after = request(
        &mut stdin,
        &mut reader,
        "10",
        "stats.group",
        json!({}),
    );
    assert_eq!(error_code(&after), Some("no_snapshot"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn bad_params_are_reported_with_codes() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let missing = request(&mut stdin, &mut reader, "1", "snapshot.load", json!({}));
    assert_eq!(error_code(&missing), Some("bad_params"));

    let _ = request(&mut stdin, &mut reader, "2", "snapshot.load", snapshot_doc());

    let no_student = request(&mut stdin, &mut reader, "3", "calendar.open", json!({}));
    assert_eq!(error_code(&no_student), Some("bad_params"));

    let bad_now = request(
        &mut stdin,
        &mut reader,
        "4",
        "calendar.open",
        json!({ "studentId": "stu-1", "now": "whenever" }),
    );
    assert_eq!(error_code(&bad_now), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}
