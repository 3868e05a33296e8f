//! Integration tests for the s3-index CLI
//!
//! Each test runs the built binary against a local stub server that answers
//! listing requests with canned `ListBucketResult` documents, using an
//! isolated config directory.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;

use tempfile::TempDir;

/// Serves canned responses in order and records each request target
struct StubServer {
    base: String,
    seen: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = seen.clone();

        thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept() else {
                    return;
                };
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&request);
                let target = head.split_whitespace().nth(1).unwrap_or_default().to_string();
                recorded.lock().unwrap().push(target);

                let response = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes());
            }
        });

        Self { base, seen }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn requests(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

fn listing_xml(prefix: &str, dirs: &[&str], keys: &[&str], next_marker: Option<&str>) -> String {
    let mut xml = format!("<ListBucketResult><Prefix>{prefix}</Prefix>");
    match next_marker {
        Some(m) => xml.push_str(&format!(
            "<IsTruncated>true</IsTruncated><NextMarker>{m}</NextMarker>"
        )),
        None => xml.push_str("<IsTruncated>false</IsTruncated>"),
    }
    for key in keys {
        xml.push_str(&format!(
            "<Contents><Key>{key}</Key><LastModified>2024-01-01T00:00:00.000Z</LastModified><Size>2048</Size></Contents>"
        ));
    }
    for dir in dirs {
        xml.push_str(&format!("<CommonPrefixes><Prefix>{dir}</Prefix></CommonPrefixes>"));
    }
    xml.push_str("</ListBucketResult>");
    xml
}

fn run(args: &[&str], config_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_s3-index"))
        .args(args)
        .env("S3_INDEX_CONFIG_DIR", config_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute s3-index")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_ls_text_table() {
    let server = StubServer::start(vec![(
        200,
        listing_xml("logs/", &["logs/2024/"], &["logs/a.txt"], None),
    )]);
    let config = TempDir::new().unwrap();

    let output = run(
        &[
            "ls",
            "--url",
            &server.url("/bucket"),
            "--bucket",
            "data",
            "--prefix",
            "logs",
            "--no-proxy",
            "--format",
            "text",
        ],
        config.path(),
    );

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let text = stdout(&output);
    assert!(text.starts_with("data / logs\n\n"));
    assert!(text.contains("Last Modified"));
    assert!(text.contains(&"-".repeat(93)));
    assert!(text.contains("../"));
    assert!(text.contains("2024/\n"));
    assert!(text.contains("a.txt\n"));
    assert!(text.contains("2.0 kB"));
    assert_eq!(server.requests(), ["/bucket?delimiter=/&prefix=logs/"]);
}

#[test]
fn test_ls_html_follows_markers() {
    let server = StubServer::start(vec![
        (200, listing_xml("", &[], &["a.txt", "b.txt"], Some("b.txt"))),
        (200, listing_xml("", &[], &["c.txt"], None)),
    ]);
    let config = TempDir::new().unwrap();

    let output = run(&["ls", "--url", &server.url("/bucket"), "--no-proxy"], config.path());

    assert!(output.status.success());
    let html = stdout(&output);
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<div id=\"navigation\">"));
    assert!(html.contains("<div id=\"listing\"><pre>"));
    assert_eq!(html.matches("Last Modified").count(), 2);
    assert!(html.find("b.txt").unwrap() < html.find("c.txt").unwrap());
    assert_eq!(
        server.requests(),
        ["/bucket?delimiter=/", "/bucket?delimiter=/&marker=b.txt"]
    );
}

#[test]
fn test_ls_json_with_summary() {
    let server = StubServer::start(vec![(
        200,
        listing_xml("", &["docs/"], &["a.txt", "b.txt"], None),
    )]);
    let config = TempDir::new().unwrap();

    let output = run(
        &["ls", "--url", &server.url("/bucket"), "--no-proxy", "--summarize", "--json"],
        config.path(),
    );

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["complete"], true);
    assert_eq!(json["pages"], 1);
    assert_eq!(json["entries"].as_array().unwrap().len(), 3);
    assert_eq!(json["entries"][0]["kind"], "directory");
    assert_eq!(json["summary"]["total_objects"], 2);
    assert_eq!(json["summary"]["total_directories"], 1);
    assert_eq!(json["summary"]["total_size_bytes"], 4096);
}

#[test]
fn test_ls_failure_keeps_partial_listing() {
    let server = StubServer::start(vec![
        (200, listing_xml("", &[], &["a.txt"], Some("a.txt"))),
        (500, "<Error><Code>InternalError</Code></Error>".into()),
    ]);
    let config = TempDir::new().unwrap();

    let output = run(&["ls", "--url", &server.url("/bucket"), "--no-proxy"], config.path());

    assert_eq!(output.status.code(), Some(3));
    let html = stdout(&output);
    assert!(html.contains("a.txt"));
    assert!(html.contains("<strong>Error: HTTP 500"));
}

#[test]
fn test_ls_missing_bucket_endpoint() {
    let server = StubServer::start(vec![(404, "<Error><Code>NoSuchBucket</Code></Error>".into())]);
    let config = TempDir::new().unwrap();

    let output = run(&["ls", "--url", &server.url("/gone"), "--no-proxy"], config.path());

    assert_eq!(output.status.code(), Some(5));
    assert!(stdout(&output).contains("<strong>Error: HTTP 404"));
}

#[test]
fn test_ls_through_relay() {
    let server = StubServer::start(vec![(200, listing_xml("", &[], &["a.txt"], None))]);
    let config = TempDir::new().unwrap();
    let relay = server.url("/relay?quest=");

    let output = run(
        &["ls", "--url", "https://data.example.com", "--proxy", &relay, "--format", "text"],
        config.path(),
    );

    assert!(output.status.success());
    assert_eq!(
        server.requests(),
        ["/relay?quest=https://data.example.com?delimiter=/"]
    );
}

#[test]
fn test_ls_from_query_and_registry() {
    let server = StubServer::start(vec![(200, listing_xml("logs/", &[], &["logs/a.txt"], None))]);
    let config = TempDir::new().unwrap();

    let output = run(&["bucket", "set", "data", &server.url("/bucket")], config.path());
    assert!(output.status.success());

    let output = run(
        &["ls", "--query", "?bucket=data&prefix=logs%2F", "--no-proxy", "--format", "text"],
        config.path(),
    );

    assert!(output.status.success());
    assert!(stdout(&output).contains("a.txt"));
    assert_eq!(server.requests(), ["/bucket?delimiter=/&prefix=logs/"]);
}

#[test]
fn test_ls_output_file() {
    let server = StubServer::start(vec![(200, listing_xml("", &[], &["a.txt"], None))]);
    let config = TempDir::new().unwrap();
    let target = config.path().join("index.html");

    let output = run(
        &[
            "ls",
            "--url",
            &server.url("/bucket"),
            "--no-proxy",
            "--page-url",
            "https://index.example.com",
            "-o",
            target.to_str().unwrap(),
        ],
        config.path(),
    );

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let html = std::fs::read_to_string(&target).unwrap();
    assert!(html.contains("<base href=\"https://index.example.com/\">"));
    assert!(html.contains("a.txt"));
}

#[test]
fn test_ls_without_bucket_is_usage_error() {
    let config = TempDir::new().unwrap();
    let output = run(&["ls", "--no-proxy"], config.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_ls_unknown_registered_bucket() {
    let config = TempDir::new().unwrap();
    let output = run(&["ls", "--bucket", "nope", "--no-proxy"], config.path());
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_bucket_registry_lifecycle() {
    let config = TempDir::new().unwrap();

    let output = run(&["bucket", "set", "data", "https://data.example.com/"], config.path());
    assert!(output.status.success());

    let output = run(&["bucket", "list", "--json"], config.path());
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["buckets"][0]["name"], "data");
    assert_eq!(json["buckets"][0]["url"], "https://data.example.com");

    let output = run(
        &["bucket", "set", "data", "https://other.example.com", "--no-overwrite"],
        config.path(),
    );
    assert_eq!(output.status.code(), Some(6));

    let output = run(&["bucket", "remove", "data"], config.path());
    assert!(output.status.success());

    let output = run(&["bucket", "remove", "data"], config.path());
    assert_eq!(output.status.code(), Some(5));

    let output = run(&["bucket", "list"], config.path());
    assert!(stdout(&output).contains("No buckets registered."));
}

#[test]
fn test_bucket_set_rejects_bad_url() {
    let config = TempDir::new().unwrap();
    let output = run(&["bucket", "set", "data", "ftp://data.example.com"], config.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_completions_bash() {
    let config = TempDir::new().unwrap();
    let output = run(&["completions", "bash"], config.path());
    assert!(output.status.success());
    assert!(stdout(&output).contains("s3-index"));
}

#[test]
fn test_ls_insecure_flag_accepted() {
    let server = StubServer::start(vec![(200, listing_xml("", &[], &["a.txt"], None))]);
    let config = TempDir::new().unwrap();

    let output = run(
        &["ls", "--url", &server.url("/bucket"), "--no-proxy", "--insecure", "--format", "text"],
        config.path(),
    );

    assert!(output.status.success());
    assert!(stdout(&output).contains("a.txt"));
}
