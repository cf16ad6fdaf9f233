//! Inbound gate scenarios over a real TCP loopback transport.

use gate::{transport::Transport, MessageGate, Outbound};
use serde_json::{json, Value};

mod fixture;

#[test]
fn valid_message_passes_and_transport_stays_open() {
    fixture::init_logging();
    let (mut client, mut server) = fixture::tcp_pair();
    let schema = fixture::message_schema();
    let gate = MessageGate::new();

    assert!(client.output(br#"{"type":"request"}"#));

    let msg = gate
        .receive(&mut server, Some(&schema))
        .expect("Expected a valid message");
    assert_eq!(msg.document()["type"], "request");
    assert!(!server.is_closed());
}

#[test]
fn schema_violation_closes_transport() {
    fixture::init_logging();
    let (mut client, mut server) = fixture::tcp_pair();
    let schema = fixture::message_schema();
    let gate = MessageGate::new();

    // Well-formed JSON, but `type` must be a string.
    assert!(client.output(br#"{"type":42}"#));

    assert!(gate.receive(&mut server, Some(&schema)).is_none());
    assert!(server.is_closed());
}

#[test]
fn malformed_json_closes_transport() {
    fixture::init_logging();
    let (mut client, mut server) = fixture::tcp_pair();
    let schema = fixture::message_schema();
    let gate = MessageGate::new();

    assert!(client.output(b"not json"));

    assert!(gate.receive(&mut server, Some(&schema)).is_none());
    assert!(server.is_closed());
}

#[test]
fn stream_end_leaves_transport_open() {
    fixture::init_logging();
    let (client, mut server) = fixture::tcp_pair();
    let schema = fixture::message_schema();
    let gate = MessageGate::new();

    // Close the client connection before any bytes are sent.
    drop(client);

    assert!(gate.receive(&mut server, Some(&schema)).is_none());
    assert!(!server.is_closed());
}

#[test]
fn no_schema_accepts_any_well_formed_json() {
    fixture::init_logging();
    let (mut client, mut server) = fixture::tcp_pair();
    let gate = MessageGate::new();

    // Would fail the message schema; unchecked mode only needs valid JSON.
    assert!(client.output(br#"{"type":42,"extra":[1,2,3]}"#));

    let msg = gate
        .receive(&mut server, None)
        .expect("Expected unchecked mode to accept the message");
    assert_eq!(msg.document()["type"], 42);
    assert!(!server.is_closed());
}

#[test]
fn received_message_round_trips_through_send() {
    fixture::init_logging();
    let (mut client, mut server) = fixture::tcp_pair();
    let schema = fixture::message_schema();
    let gate = MessageGate::new();

    let original = json!({"type": "request", "seq": 3, "command": "threads"});
    assert!(client.output(original.to_string().as_bytes()));

    let msg = gate
        .receive(&mut server, Some(&schema))
        .expect("Expected a valid message");

    // Echo the document back and reparse it on the client side.
    let outbound = Outbound::new(msg.into_document()).finish();
    gate.send(&mut server, &outbound);

    let echoed = client.input().expect("Expected the echoed message");
    let reparsed: Value = serde_json::from_slice(&echoed).unwrap();
    assert_eq!(reparsed, original);
}
