//! Handshake headers and the line-oriented reading shared by both roles.
//!
//! Header names are kept exactly as the peer sent them: `Upgrade` and
//! `upgrade` are two different headers in this draft of the protocol.

use std::collections::hash_map::{HashMap, Iter};
use std::fmt;

pub use self::lines::{line_text, read_headers, read_line, read_line_with_limit, MAX_LINE_LEN};

mod lines;

/// `Upgrade` header name
pub const UPGRADE: &str = "Upgrade";
/// `Connection` header name
pub const CONNECTION: &str = "Connection";
/// `Host` header name
pub const HOST: &str = "Host";
/// `Origin` header name
pub const ORIGIN: &str = "Origin";
/// `WebSocket-Origin` header name, sent by the server
pub const WEBSOCKET_ORIGIN: &str = "WebSocket-Origin";
/// `WebSocket-Location` header name, sent by the server
pub const WEBSOCKET_LOCATION: &str = "WebSocket-Location";

/// The only accepted value of the `Upgrade` header
pub const UPGRADE_WEBSOCKET: &str = "WebSocket";
/// The only accepted value of the `Connection` header
pub const CONNECTION_UPGRADE: &str = "Upgrade";

/// The headers received during a handshake.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headers {
	map: HashMap<String, String>,
}

impl Headers {
	/// Creates an empty header set
	pub fn new() -> Headers {
		Headers::default()
	}

	/// Sets a header, replacing any earlier value under the same name.
	pub fn insert<K, V>(&mut self, name: K, value: V) -> Option<String>
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.map.insert(name.into(), value.into())
	}

	/// Gets the value of the header with exactly this name.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.map.get(name).map(String::as_str)
	}

	/// Returns true when a header with exactly this name was received.
	pub fn contains(&self, name: &str) -> bool {
		self.map.contains_key(name)
	}

	/// Number of distinct header names
	pub fn len(&self) -> usize {
		self.map.len()
	}

	/// True if no header was received
	pub fn is_empty(&self) -> bool {
		self.map.is_empty()
	}

	/// Iterates over `(name, value)` pairs in no particular order.
	pub fn iter(&self) -> Iter<'_, String, String> {
		self.map.iter()
	}

	/// Checks the `Upgrade: WebSocket` and `Connection: Upgrade` pair every
	/// handshake, in either direction, must carry.
	pub fn check_upgrade(&self) -> Result<(), String> {
		expect_value(self, UPGRADE, UPGRADE_WEBSOCKET)?;
		expect_value(self, CONNECTION, CONNECTION_UPGRADE)
	}

	/// Gets a header that must be present.
	pub fn require(&self, name: &str) -> Result<&str, String> {
		self.get(name).ok_or_else(|| format!("missing {} header", name))
	}
}

fn expect_value(headers: &Headers, name: &str, expected: &str) -> Result<(), String> {
	match headers.get(name) {
		Some(value) if value == expected => Ok(()),
		Some(value) => Err(format!("invalid {}: {}", name, value)),
		None => Err(format!("missing {} header", name)),
	}
}

impl fmt::Display for Headers {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		for (name, value) in self.iter() {
			write!(fmt, "{}: {}\r\n", name, value)?;
		}
		Ok(())
	}
}
