//! Integration tests for the load command against a stub HTTP endpoint.

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

fn fixture_shift() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fixture-shift"));
    for var in ["HTTP_PROXY", "http_proxy", "HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"] {
        cmd.env_remove(var);
    }
    cmd.env("NO_PROXY", "127.0.0.1");
    cmd
}

/// Minimal HTTP server recording request lines and bodies. Bodies
/// containing `fail_on` get a ClickHouse-style exception reply.
struct StubServer {
    url: String,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl StubServer {
    fn start(fail_on: Option<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut content_length = 0usize;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                    let lower = header.to_ascii_lowercase();
                    if let Some(value) = lower.strip_prefix("content-length:") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                let mut body = vec![0u8; content_length];
                reader.read_exact(&mut body).unwrap();
                let body = String::from_utf8_lossy(&body).into_owned();

                let reply = match fail_on {
                    Some(marker) if body.contains(marker) => {
                        "Code: 62. DB::Exception: Syntax error: failed at position 1"
                    }
                    _ => "",
                };
                recorded
                    .lock()
                    .unwrap()
                    .push((request_line.trim().to_string(), body));

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    reply.len(),
                    reply
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
        });

        Self { url, requests }
    }

    fn bodies(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }
}

const CONVERTED: &str = "\
-- Test Data for ClickHouse
TRUNCATE TABLE IF EXISTS events;
INSERT INTO events (id, event_type, user_id) VALUES (1, 'login', 'user_0001');
INSERT INTO events (id, event_type, user_id) VALUES (2, 'login', 'user_0002');
INSERT INTO events (id, event_type, user_id) VALUES (3, 'payment', 'user_0003');
INSERT INTO list_entries (id, list_id, value) VALUES (1, 'vip_users', 'vip_0001');

-- Total events inserted: 3
";

#[test]
fn test_load_batches_rows() {
    let server = StubServer::start(None);
    let temp_dir = TempDir::new().unwrap();
    let input_file = temp_dir.path().join("clickhouse.sql");
    fs::write(&input_file, CONVERTED).unwrap();

    let output = fixture_shift()
        .args([
            "load",
            input_file.to_str().unwrap(),
            &server.url,
            "--batch-size",
            "2",
            "--database",
            "fixtures",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);

    let bodies = server.bodies();
    assert_eq!(
        bodies,
        vec![
            "TRUNCATE TABLE IF EXISTS events;".to_string(),
            "INSERT INTO events VALUES (1, 'login', 'user_0001'), (2, 'login', 'user_0002');"
                .to_string(),
            "INSERT INTO events VALUES (3, 'payment', 'user_0003');".to_string(),
            "INSERT INTO list_entries VALUES (1, 'vip_users', 'vip_0001');".to_string(),
        ]
    );

    let requests = server.requests.lock().unwrap();
    assert!(requests
        .iter()
        .all(|(line, _)| line.starts_with("POST /?database=fixtures ")));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Loaded 4 rows in 3 batches, 1 statements executed"));
}

#[test]
fn test_load_reports_failures_and_continues() {
    let server = StubServer::start(Some("user_0002"));
    let temp_dir = TempDir::new().unwrap();
    let input_file = temp_dir.path().join("clickhouse.sql");
    fs::write(&input_file, CONVERTED).unwrap();

    let output = fixture_shift()
        .args([
            "load",
            input_file.to_str().unwrap(),
            &server.url,
            "-b",
            "2",
            "--json",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(server.bodies().len(), 4);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["report"]["rows_loaded"], 2);
    assert_eq!(json["report"]["errors"][0]["context"], "Batch insert failed");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Warning: Batch insert failed: Code: 62. DB::Exception"));
    assert!(stderr.contains("1 requests failed"));
}

#[test]
fn test_load_url_from_config() {
    let server = StubServer::start(None);
    let temp_dir = TempDir::new().unwrap();
    let input_file = temp_dir.path().join("clickhouse.sql");
    let config_file = temp_dir.path().join("load.yaml");
    fs::write(&input_file, CONVERTED).unwrap();
    fs::write(
        &config_file,
        format!(
            "connection:\n  url: {}\n  user: loader\nbatch:\n  batch_size: 100\n",
            server.url
        ),
    )
    .unwrap();

    let output = fixture_shift()
        .args([
            "load",
            input_file.to_str().unwrap(),
            "--config",
            config_file.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);
    let bodies = server.bodies();
    assert_eq!(bodies.len(), 3);
    assert!(bodies[1].contains("(3, 'payment', 'user_0003')"));
}

#[test]
fn test_load_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.sql");

    let output = fixture_shift()
        .args(["load", missing.to_str().unwrap(), "http://127.0.0.1:9"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SQL file not found"));
}

#[test]
fn test_load_requires_url() {
    let temp_dir = TempDir::new().unwrap();
    let input_file = temp_dir.path().join("clickhouse.sql");
    fs::write(&input_file, CONVERTED).unwrap();

    let output = fixture_shift()
        .args(["load", input_file.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ClickHouse URL required"));
}
