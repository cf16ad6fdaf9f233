//! Outbound gate scenarios.

use std::io::Read;
use std::net::TcpStream;

use gate::{transport::FramedTransport, transport::Transport, MessageGate, Outbound};
use serde::Serialize;
use serde_json::json;

mod fixture;

#[test]
fn incomplete_document_writes_nothing() {
    fixture::init_logging();
    let (mut client, mut server) = fixture::tcp_pair();
    let gate = MessageGate::new();

    // The incomplete document must produce no bytes at all. Prove it by
    // following it with a sentinel: the sentinel is the first thing the
    // peer sees.
    gate.send(&mut client, &Outbound::new(json!({"type": "response"})));
    gate.send(
        &mut client,
        &Outbound::new(json!({"type": "sentinel"})).finish(),
    );

    let first = server.input().expect("Expected the sentinel message");
    assert_eq!(first, br#"{"type":"sentinel"}"#);
}

#[test]
fn complete_document_is_framed_with_exact_length() {
    fixture::init_logging();
    let (client, mut server_stream): (TcpStream, TcpStream) = fixture::tcp_streams();
    let mut client = FramedTransport::from_tcp(client).unwrap();
    let gate = MessageGate::new();

    let outbound = Outbound::new(json!({"type": "event", "event": "stopped"})).finish();
    gate.send(&mut client, &outbound);
    drop(client);

    // Read the raw bytes on the peer to check the wire format.
    let mut raw = Vec::new();
    server_stream.read_to_end(&mut raw).unwrap();
    let payload = br#"{"event":"stopped","type":"event"}"#;
    let expected = format!(
        "Content-Length: {}\r\n\r\n{}",
        payload.len(),
        std::str::from_utf8(payload).unwrap()
    );
    assert_eq!(std::str::from_utf8(&raw).unwrap(), expected);
}

#[test]
fn typed_document_serializes_through_the_gate() {
    #[derive(Serialize)]
    struct StoppedEvent {
        r#type: String,
        reason: String,
    }

    fixture::init_logging();
    let (mut client, mut server) = fixture::tcp_pair();
    let gate = MessageGate::new();

    let outbound = Outbound::from_serialize(&StoppedEvent {
        r#type: "event".to_string(),
        reason: "breakpoint".to_string(),
    });
    assert!(outbound.is_complete());
    gate.send(&mut client, &outbound);

    let buf = server.input().expect("Expected the typed message");
    let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(value["reason"], "breakpoint");
}

#[test]
fn write_failure_is_silent() {
    fixture::init_logging();
    let (mut client, _server) = fixture::tcp_pair();
    let gate = MessageGate::new();

    // A closed handle refuses the write; send resolves that locally.
    client.close();
    let outbound = Outbound::new(json!({"type": "response"})).finish();
    gate.send(&mut client, &outbound);
    assert!(client.is_closed());
}
