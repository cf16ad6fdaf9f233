//! Shared setup for the gate integration tests: logging, loopback transport
//! pairs, and temp schema files.

#![allow(dead_code)]

use std::{
    io::BufReader,
    net::{TcpListener, TcpStream},
    path::PathBuf,
    sync::OnceLock,
};

use gate::transport::FramedTransport;

pub type TcpTransport = FramedTransport<BufReader<TcpStream>, TcpStream>;

/// A schema requiring a string `type` field, the envelope every
/// debug-adapter message starts with.
pub const MESSAGE_SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "type": { "type": "string" }
    },
    "required": ["type"],
    "examples": [
        { "type": "request" },
        { "type": "response" },
        { "type": "event" }
    ]
}"#;

static LOGGER: OnceLock<flexi_logger::LoggerHandle> = OnceLock::new();

/// Route gate logging to stderr for test debugging.
pub fn init_logging() {
    LOGGER.get_or_init(|| {
        flexi_logger::Logger::try_with_env_or_str("info")
            .unwrap()
            .start()
            .unwrap()
    });
}

/// Open a loopback TCP connection and wrap both ends in framed transports.
/// Returns (client, server).
pub fn tcp_pair() -> (TcpTransport, TcpTransport) {
    let (client, server) = tcp_streams();
    (
        FramedTransport::from_tcp(client).unwrap(),
        FramedTransport::from_tcp(server).unwrap(),
    )
}

/// Open a loopback TCP connection, returning the raw streams.
pub fn tcp_streams() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (server, _) = listener.accept().unwrap();
    (client, server)
}

/// Write contents to a fresh temp file, returning its path. Callers remove
/// the file when done.
pub fn write_temp_file(tag: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "gate-tests-{tag}-{}-{}.json",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::write(&path, contents.as_bytes()).unwrap();
    path
}

/// Load the message schema through the real loader, from a temp file.
pub fn message_schema() -> gate::schema::Schema {
    let path = write_temp_file("message-schema", MESSAGE_SCHEMA);
    let schema = gate::schema::load_schema(&path).expect("fixture schema should load");
    let _ = std::fs::remove_file(&path);
    schema
}
