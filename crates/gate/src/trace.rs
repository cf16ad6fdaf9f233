//! Diagnostic sink for the message gate.
//!
//! Tracing is an injected capability rather than a build-time switch: a
//! production gate carries a [`NullTrace`] and emits nothing, while a
//! debugging setup hands it a [`LogTrace`] to forward everything to the
//! `log` facade. The sink never affects control flow.

use crate::GateError;

/// Receiver for the gate's diagnostics.
pub trait Trace {
    /// A raw inbound buffer that passed the gate.
    fn message_in(&self, raw: &[u8]);

    /// A serialized outbound buffer that was written to the transport.
    fn message_out(&self, raw: &[u8]);

    /// A structured description of a rejected inbound message.
    fn protocol_error(&self, err: &GateError);
}

/// Sink that discards everything.
pub struct NullTrace;

impl Trace for NullTrace {
    fn message_in(&self, _raw: &[u8]) {}
    fn message_out(&self, _raw: &[u8]) {}
    fn protocol_error(&self, _err: &GateError) {}
}

/// Sink that forwards to the `log` facade.
pub struct LogTrace;

impl Trace for LogTrace {
    fn message_in(&self, raw: &[u8]) {
        log::trace!("Received: {}", String::from_utf8_lossy(raw));
    }

    fn message_out(&self, raw: &[u8]) {
        log::trace!("Sent: {}", String::from_utf8_lossy(raw));
    }

    fn protocol_error(&self, err: &GateError) {
        log::error!("{err}");
    }
}
