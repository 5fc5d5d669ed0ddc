#![warn(missing_docs)]
#![deny(unused_mut)]

//! websocket-hixie speaks the early draft (hixie-75/76 era) WebSocket
//! protocol, the one spoken by Flash based WebSocket shims.
//!
//! Messages travel as `0x00 <utf-8 payload> 0xFF` frames after a plain-text
//! HTTP upgrade handshake. There are no opcodes, no masking and no closing
//! handshake: a connection ends when its stream ends.
//!
//! # Clients
//! To make a client use the `ClientBuilder` struct. Only `ws://` URLs are
//! supported.
//!
//! # Servers
//! `Server` binds a TCP port and runs a handler on its own thread for every
//! accepted connection. The handler gets a `server::Connection` whose
//! handshake request was read and whose origin was checked against the
//! accepted domain patterns of the `ServerConfig`; it answers with
//! `respond` or `handshake` before exchanging messages. Cross-domain
//! policy-file probes are answered on the same port.
//!
//! # Both sides
//! Client and server connections implement the `WebSocket` trait, which
//! carries `send`, `receive` and `close`. Either can be `split` into a
//! `receiver::Reader` and a `sender::Writer` to read and write from
//! different threads.
//!
//! Setting `wire_trace` on a `ClientBuilder` or `ServerConfig` logs every
//! handshake line and frame at debug level under the
//! `websocket_hixie::wire` target.
pub use url;

pub mod dataframe;
pub mod framed;
pub mod header;
pub mod origin;
pub mod result;
pub mod stream;
pub mod ws;

pub mod receiver;
pub mod sender;

pub mod client;
pub mod server;

pub use crate::client::{Client, ClientBuilder};
pub use crate::origin::OriginPolicy;
pub use crate::result::{WebSocketError, WebSocketResult};
pub use crate::server::{Connection, Server, ServerConfig};
pub use crate::ws::{Role, WebSocket};
