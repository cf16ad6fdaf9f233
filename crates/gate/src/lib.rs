//! Validated message gate for a debug-adapter protocol endpoint.
//!
//! This crate sits between a raw transport and the debugger core. Inbound,
//! it turns byte buffers into parsed, optionally schema-checked protocol
//! messages; outbound, it serializes fully built messages back to bytes.
//! Anything malformed is rejected locally: the gate never propagates an
//! error past its boundary, it only yields an absent result and, when the
//! bytes indicate protocol corruption, commands the transport to close.

pub mod file;
pub mod schema;
pub mod trace;
pub mod transport;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use schema::Schema;
use trace::{LogTrace, Trace};
use transport::Transport;

/// The ways an inbound buffer can be rejected.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Input is not a valid JSON. Error(offset {offset}): {message}")]
    MalformedJson { offset: usize, message: String },

    #[error(
        "Invalid schema: {schema_pointer}. Invalid keyword: {keyword}. \
         Invalid document: {document_pointer}"
    )]
    InvalidDocument {
        schema_pointer: String,
        keyword: String,
        document_pointer: String,
    },
}

/// A validated inbound protocol message.
///
/// Wraps the parsed document; ownership transfers to the caller when
/// [`MessageGate::receive`] returns it.
#[derive(Debug, PartialEq)]
pub struct Message {
    document: Value,
}

impl Message {
    fn new(document: Value) -> Message {
        Message { document }
    }

    /// The parsed document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Take ownership of the parsed document.
    pub fn into_document(self) -> Value {
        self.document
    }

    /// Recover a typed view of the message.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the document does not match the
    /// requested shape.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.document)
    }
}

/// An outbound protocol message: a JSON value plus the caller's explicit
/// assertion that it is fully built.
#[derive(Debug)]
pub struct Outbound {
    body: Value,
    complete: bool,
}

impl Outbound {
    /// Wrap a document the caller is still assembling. [`MessageGate::send`]
    /// ignores it until [`finish`](Outbound::finish) marks it complete.
    pub fn new(body: Value) -> Outbound {
        Outbound {
            body,
            complete: false,
        }
    }

    /// Assert that the document is fully built.
    pub fn finish(mut self) -> Outbound {
        self.complete = true;
        self
    }

    /// Build a complete outbound document from any serializable value.
    ///
    /// The result is incomplete exactly when serialization fails, which makes
    /// sending it a no-op.
    pub fn from_serialize<T: Serialize>(value: &T) -> Outbound {
        match serde_json::to_value(value) {
            Ok(body) => Outbound {
                body,
                complete: true,
            },
            Err(e) => {
                log::error!("Outbound document failed to serialize: {e}");
                Outbound {
                    body: Value::Null,
                    complete: false,
                }
            }
        }
    }

    /// Whether the caller has marked the document fully built.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The document body.
    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// The validation boundary between raw transport bytes and structured
/// protocol messages.
///
/// The gate holds only its diagnostic sink. The transport and the optional
/// compiled schema stay owned by the caller and are passed into each call,
/// so one gate serves arbitrarily many messages over the process lifetime.
pub struct MessageGate {
    trace: Box<dyn Trace>,
}

impl MessageGate {
    /// A gate that traces through the `log` facade.
    pub fn new() -> MessageGate {
        MessageGate {
            trace: Box::new(LogTrace),
        }
    }

    /// A gate with an injected diagnostic sink.
    pub fn with_trace(trace: Box<dyn Trace>) -> MessageGate {
        MessageGate { trace }
    }

    /// Pull one message from the transport.
    ///
    /// Returns `None` in three cases. When the transport has no more data the
    /// transport is left open: stream end is an expected terminal condition.
    /// When the buffer is not valid JSON, or parses but fails validation
    /// against a supplied schema, the transport is commanded to close before
    /// returning: the protocol has no partial-message recovery, so a corrupt
    /// message poisons the framing and a fresh channel is safer than
    /// attempting resynchronization.
    ///
    /// With no schema supplied, any well-formed JSON passes.
    pub fn receive(
        &self,
        transport: &mut dyn Transport,
        schema: Option<&Schema>,
    ) -> Option<Message> {
        let buf = transport.input()?;
        let document = match parse_document(&buf) {
            Ok(document) => document,
            Err(e) => {
                self.trace.protocol_error(&e);
                transport.close();
                return None;
            }
        };
        if let Some(schema) = schema {
            if let Err(e) = schema.check(&document) {
                self.trace.protocol_error(&e);
                transport.close();
                return None;
            }
        }
        self.trace.message_in(&buf);
        Some(Message::new(document))
    }

    /// Serialize one fully built message and write it to the transport.
    ///
    /// A document not marked complete is a contract violation by the caller,
    /// not a runtime condition: nothing is written and nothing is reported.
    /// A transport write failure is likewise resolved locally, with no retry.
    /// Outbound documents are not validated against any schema; the caller is
    /// trusted to construct conformant output.
    pub fn send(&self, transport: &mut dyn Transport, outbound: &Outbound) {
        if !outbound.is_complete() {
            return;
        }
        let payload = match serde_json::ser::to_vec(outbound.body()) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Outbound document failed to serialize: {e}");
                return;
            }
        };
        if !transport.output(&payload) {
            return;
        }
        self.trace.message_out(&payload);
    }
}

impl Default for MessageGate {
    fn default() -> Self {
        Self::new()
    }
}

// Parse one raw buffer, mapping the parser's line/column position back to a
// byte offset into the buffer.
pub(crate) fn parse_document(buf: &[u8]) -> Result<Value, GateError> {
    serde_json::from_slice(buf).map_err(|e| GateError::MalformedJson {
        offset: byte_offset(buf, e.line(), e.column()),
        message: e.to_string(),
    })
}

// Translate a one-based line/column position into a byte offset, clamped to
// the buffer length.
fn byte_offset(buf: &[u8], line: usize, column: usize) -> usize {
    let mut offset = 0;
    let mut remaining = line.saturating_sub(1);
    while remaining > 0 {
        match buf[offset..].iter().position(|b| *b == b'\n') {
            Some(pos) => offset += pos + 1,
            None => break,
        }
        remaining -= 1;
    }
    (offset + column.saturating_sub(1)).min(buf.len())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    struct MockTransport {
        inbound: VecDeque<Vec<u8>>,
        written: Vec<Vec<u8>>,
        accept_writes: bool,
        close_count: usize,
    }

    impl MockTransport {
        fn with_inbound(bufs: &[&[u8]]) -> MockTransport {
            MockTransport {
                inbound: bufs.iter().map(|b| b.to_vec()).collect(),
                written: Vec::new(),
                accept_writes: true,
                close_count: 0,
            }
        }

        fn empty() -> MockTransport {
            Self::with_inbound(&[])
        }
    }

    impl Transport for MockTransport {
        fn input(&mut self) -> Option<Vec<u8>> {
            if self.is_closed() {
                return None;
            }
            self.inbound.pop_front()
        }

        fn output(&mut self, buf: &[u8]) -> bool {
            if self.is_closed() || !self.accept_writes {
                return false;
            }
            self.written.push(buf.to_vec());
            true
        }

        fn close(&mut self) {
            self.close_count += 1;
        }

        fn is_closed(&self) -> bool {
            self.close_count > 0
        }
    }

    #[derive(Default)]
    struct CountingTrace {
        errors: Arc<AtomicUsize>,
    }

    impl Trace for CountingTrace {
        fn message_in(&self, _raw: &[u8]) {}
        fn message_out(&self, _raw: &[u8]) {}
        fn protocol_error(&self, _err: &GateError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn message_schema() -> Schema {
        let document = json!({
            "type": "object",
            "properties": {
                "type": { "type": "string" }
            },
            "required": ["type"]
        });
        Schema::compile(&document).unwrap()
    }

    #[test]
    fn receive_valid_message_with_schema() {
        let gate = MessageGate::new();
        let schema = message_schema();
        let mut transport = MockTransport::with_inbound(&[br#"{"type":"request"}"#]);
        let msg = gate.receive(&mut transport, Some(&schema)).unwrap();
        assert_eq!(msg.document()["type"], "request");
        assert!(!transport.is_closed());
    }

    #[test]
    fn receive_malformed_json_closes_transport() {
        let errors = Arc::new(AtomicUsize::new(0));
        let gate = MessageGate::with_trace(Box::new(CountingTrace {
            errors: errors.clone(),
        }));
        let mut transport = MockTransport::with_inbound(&[b"not json"]);
        assert!(gate.receive(&mut transport, None).is_none());
        assert_eq!(transport.close_count, 1);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn receive_schema_violation_closes_transport() {
        let gate = MessageGate::new();
        let schema = message_schema();
        let mut transport = MockTransport::with_inbound(&[br#"{"type":42}"#]);
        assert!(gate.receive(&mut transport, Some(&schema)).is_none());
        assert_eq!(transport.close_count, 1);
    }

    #[test]
    fn receive_without_schema_skips_validation() {
        let gate = MessageGate::new();
        // This document violates the message schema, but no schema was
        // supplied so only well-formedness counts.
        let mut transport = MockTransport::with_inbound(&[br#"{"type":42}"#]);
        let msg = gate.receive(&mut transport, None).unwrap();
        assert_eq!(msg.document()["type"], 42);
        assert!(!transport.is_closed());
    }

    #[test]
    fn receive_on_exhausted_transport_leaves_it_open() {
        let gate = MessageGate::new();
        let schema = message_schema();
        let mut transport = MockTransport::empty();
        assert!(gate.receive(&mut transport, Some(&schema)).is_none());
        assert_eq!(transport.close_count, 0);
    }

    #[test]
    fn send_incomplete_document_is_a_noop() {
        let gate = MessageGate::new();
        let mut transport = MockTransport::empty();
        let outbound = Outbound::new(json!({"type": "response"}));
        gate.send(&mut transport, &outbound);
        assert!(transport.written.is_empty());
    }

    #[test]
    fn send_complete_document_writes_serialized_bytes() {
        let gate = MessageGate::new();
        let mut transport = MockTransport::empty();
        let outbound = Outbound::new(json!({"type": "response"})).finish();
        gate.send(&mut transport, &outbound);
        assert_eq!(transport.written.len(), 1);
        assert_eq!(transport.written[0], br#"{"type":"response"}"#);
    }

    #[test]
    fn send_write_failure_is_silent() {
        let gate = MessageGate::new();
        let mut transport = MockTransport::empty();
        transport.accept_writes = false;
        let outbound = Outbound::new(json!({"type": "response"})).finish();
        gate.send(&mut transport, &outbound);
        assert!(transport.written.is_empty());
        assert_eq!(transport.close_count, 0);
    }

    #[test]
    fn receive_then_send_round_trips() {
        let gate = MessageGate::new();
        let schema = message_schema();
        let raw: &[u8] = br#"{"type":"request","seq":12}"#;
        let mut transport = MockTransport::with_inbound(&[raw]);
        let msg = gate.receive(&mut transport, Some(&schema)).unwrap();

        let original = msg.document().clone();
        let outbound = Outbound::new(msg.into_document()).finish();
        gate.send(&mut transport, &outbound);

        let reparsed: Value = serde_json::from_slice(&transport.written[0]).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn decode_typed_message() {
        #[derive(Deserialize)]
        struct Envelope {
            r#type: String,
        }

        let gate = MessageGate::new();
        let mut transport = MockTransport::with_inbound(&[br#"{"type":"request"}"#]);
        let msg = gate.receive(&mut transport, None).unwrap();
        let envelope: Envelope = msg.decode().unwrap();
        assert_eq!(envelope.r#type, "request");
    }

    #[test]
    fn from_serialize_is_complete() {
        #[derive(Serialize)]
        struct Envelope {
            r#type: String,
        }

        let outbound = Outbound::from_serialize(&Envelope {
            r#type: "event".to_string(),
        });
        assert!(outbound.is_complete());
        assert_eq!(outbound.body()["type"], "event");
    }

    #[test]
    fn malformed_json_reports_byte_offset() {
        let err = parse_document(br#"{"type": }"#).unwrap_err();
        match err {
            GateError::MalformedJson { offset, .. } => assert_eq!(offset, 9),
            other => panic!("Expected a parse failure but got {other:?}"),
        }
    }

    #[test]
    fn byte_offset_spans_lines() {
        let buf = b"{\n  \"type\": }";
        // Line 2, column 11 is the bad token.
        assert_eq!(byte_offset(buf, 2, 11), 12);
        // Positions past the end clamp to the buffer length.
        assert_eq!(byte_offset(buf, 9, 99), buf.len());
    }
}
