//! Transport tests for the blocking completion client.
//!
//! A minimal single-shot TCP responder stands in for the API so the status
//! and body mapping can be checked without a live endpoint.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use verdant::completion::{
    CompletionApi, CompletionClientBuilder, CompletionRequest, TransportError,
};

/// Serves exactly one HTTP response on a fresh local port, sending the raw
/// request text back over a channel for inspection.
fn one_shot_server(status_line: &str, body: &str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let addr = listener.local_addr().expect("local addr");
    let response = format!(
        "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        let mut reader = BufReader::new(stream);

        let mut request = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read header line");
            if let Some(value) = line
                .to_ascii_lowercase()
                .strip_prefix("content-length:")
                .map(str::trim)
            {
                content_length = value.parse().unwrap_or(0);
            }
            let done = line == "\r\n" || line == "\n";
            request.push_str(&line);
            if done {
                break;
            }
        }
        let mut body_bytes = vec![0u8; content_length];
        reader.read_exact(&mut body_bytes).expect("read body");
        request.push_str(&String::from_utf8_lossy(&body_bytes));

        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).expect("write response");
        stream.flush().expect("flush response");

        let _ = tx.send(request);
    });

    (format!("http://{addr}"), rx)
}

#[test]
fn successful_completion_returns_message_content() {
    let (base_url, rx) = one_shot_server(
        "HTTP/1.1 200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"Answer: fine."}}]}"#,
    );

    let client = CompletionClientBuilder::new()
        .base_url(base_url)
        .api_key("test-key")
        .build()
        .expect("build client");

    let request = CompletionRequest::new("sonar", "hello");
    let content = client.complete(&request).expect("completion");
    assert_eq!(content, "Answer: fine.");

    let raw_request = rx.recv().expect("captured request");
    let lowered = raw_request.to_ascii_lowercase();
    assert!(lowered.starts_with("post /chat/completions"));
    assert!(lowered.contains("authorization: bearer test-key"));
    assert!(raw_request.contains(r#""model":"sonar""#));
}

#[test]
fn server_error_maps_to_http_variant_with_body() {
    let (base_url, _rx) = one_shot_server("HTTP/1.1 500 Internal Server Error", "upstream blew up");

    let client = CompletionClientBuilder::new()
        .base_url(base_url)
        .api_key("test-key")
        .build()
        .expect("build client");

    let request = CompletionRequest::new("sonar", "hello");
    let err = client.complete(&request).unwrap_err();

    match err {
        TransportError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream blew up");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[test]
fn missing_choices_is_a_malformed_response() {
    let (base_url, _rx) = one_shot_server("HTTP/1.1 200 OK", r#"{"choices":[]}"#);

    let client = CompletionClientBuilder::new()
        .base_url(base_url)
        .api_key("test-key")
        .build()
        .expect("build client");

    let request = CompletionRequest::new("sonar", "hello");
    let err = client.complete(&request).unwrap_err();
    assert!(matches!(err, TransportError::MalformedResponse { .. }));
}

#[test]
fn invalid_base_url_fails_at_build_time() {
    let result = CompletionClientBuilder::new()
        .base_url("not a url")
        .api_key("test-key")
        .build();

    assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
}

#[test]
fn unreachable_host_is_a_network_error() {
    // Port 9 is the discard service, which is virtually never open locally.
    let client = CompletionClientBuilder::new()
        .base_url("http://127.0.0.1:9")
        .api_key("test-key")
        .build()
        .expect("build client");

    let request = CompletionRequest::new("sonar", "hello");
    let err = client.complete(&request).unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}
