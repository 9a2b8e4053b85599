//! Replays scenario files from disk.

use std::{io::Write, path::Path};

use bookframe_cli::{ReplayError, load_scenario, replay};
use bookframe_core::Status;

fn write_scenario(json: &str) -> tempfile::NamedTempFile {
    let Ok(mut file) = tempfile::NamedTempFile::new() else {
        unreachable!("temp file must be creatable");
    };
    let Ok(()) = file.write_all(json.as_bytes()) else {
        unreachable!("temp file must be writable");
    };
    file
}

#[tokio::test]
async fn replays_scenario_file() {
    let file = write_scenario(
        r#"{
            "name": "loads then completes",
            "booking_url": "https://www.bokadirekt.se/boka-tjanst/salong/klippning-123",
            "steps": [
                { "at_ms": 1200, "event": "frame_loaded" },
                { "at_ms": 4000, "event": "message", "origin": "https://www.bokadirekt.se",
                  "data": "{\"type\":\"booking_complete\"}" },
                { "at_ms": 5000, "event": "close" }
            ]
        }"#,
    );

    let Ok(scenario) = load_scenario(file.path()) else {
        unreachable!("scenario must load");
    };
    let Ok(result) = replay(&scenario).await else {
        unreachable!("scenario must replay");
    };

    assert_eq!(result.report.status, Status::Ready);
    assert_eq!(result.report.signals.len(), 1);
    assert!(result.violations.is_empty());

    let rendered = result.to_string();
    assert!(rendered.starts_with("scenario: loads then completes\n"));
    assert!(rendered.contains("status:   ready"));
    assert!(rendered.contains("signals:  1"));
}

#[test]
fn missing_file_reports_path() {
    let result = load_scenario(Path::new("/nonexistent/scenario.json"));
    assert!(
        matches!(result, Err(ReplayError::Io { ref path, .. }) if path == "/nonexistent/scenario.json")
    );
}

#[test]
fn malformed_file_is_parse_error() {
    let file = write_scenario(r#"{ "steps": "soon" }"#);
    assert!(matches!(load_scenario(file.path()), Err(ReplayError::Parse(_))));
}

#[tokio::test]
async fn invalid_booking_url_fails_replay() {
    let file = write_scenario(r#"{ "booking_url": "not a url", "steps": [] }"#);
    let Ok(scenario) = load_scenario(file.path()) else {
        unreachable!("scenario must load");
    };

    assert!(matches!(replay(&scenario).await, Err(ReplayError::Runtime(_))));
}
