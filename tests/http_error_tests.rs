//! Error-status handling over a real socket: a local server answers the
//! conversation setup normally, then fails the chat call with a 500.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use hiagent::{ClientConfig, HiAgentClient, HiAgentError};

/// Drain one HTTP request: headers plus `Content-Length` bytes of body.
fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + content_length {
                return;
            }
        }
    }
}

/// `Connection: close` so the client opens a fresh connection per request.
fn respond(stream: &mut TcpStream, status_line: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).unwrap();
    stream.flush().unwrap();
}

#[test]
fn non_2xx_blocking_chat_propagates_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_request(&mut stream);
        respond(
            &mut stream,
            "200 OK",
            r#"{"Conversation": {"AppConversationID": "conv-1"}}"#,
        );

        let (mut stream, _) = listener.accept().unwrap();
        read_request(&mut stream);
        respond(
            &mut stream,
            "500 Internal Server Error",
            r#"{"error": "upstream failure"}"#,
        );
    });

    let client =
        HiAgentClient::new(ClientConfig::new(format!("http://{addr}"), "sk-test")).unwrap();
    client.create_conversation("test_user", None).unwrap();

    let err = match client.chat_query_blocking("hello", None) {
        Err(HiAgentError::Http(err)) => err,
        other => panic!("expected an http error, got {other:?}"),
    };
    assert!(err.is_status());
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));

    server.join().unwrap();
}

#[test]
fn non_2xx_create_conversation_propagates_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_request(&mut stream);
        respond(&mut stream, "403 Forbidden", r#"{"error": "bad api key"}"#);
    });

    let client =
        HiAgentClient::new(ClientConfig::new(format!("http://{addr}"), "sk-test")).unwrap();

    let err = match client.create_conversation("test_user", None) {
        Err(HiAgentError::Http(err)) => err,
        other => panic!("expected an http error, got {other:?}"),
    };
    assert_eq!(err.status().map(|s| s.as_u16()), Some(403));

    // The failed call must not leave a half-initialized session behind.
    assert!(client.conversation_id().is_none());

    server.join().unwrap();
}
