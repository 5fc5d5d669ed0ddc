//! Reads the handshake request of a client and decides whether to upgrade.
//!
//! A `Connection` is created once the request line, the headers and the
//! origin passed. The answer is not written until `respond` (or its
//! shortcut `handshake`) is called, so a handler can look at the path and
//! the headers first and add its own response headers.
use std::io::Result as IoResult;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};

use crate::framed::Framed;
use crate::header::{
	line_text, Headers, CONNECTION, CONNECTION_UPGRADE, HOST, ORIGIN, UPGRADE, UPGRADE_WEBSOCKET,
	WEBSOCKET_LOCATION, WEBSOCKET_ORIGIN,
};
use crate::receiver::Reader;
use crate::result::{WebSocketError, WebSocketResult};
use crate::sender::Writer;
use crate::server::ServerConfig;
use crate::stream::{AsTcpStream, Shutdown, Splittable, Stream};
use crate::ws::{Role, WebSocket};

/// The status `handshake` answers with.
pub const DEFAULT_STATUS: &str = "101 Web Socket Protocol Handshake";

/// Returns the path of a `GET <path> HTTP/1.1` request line.
fn request_path(line: &str) -> Option<&str> {
	let path = line.strip_prefix("GET ")?.strip_suffix(" HTTP/1.1")?;
	if path.is_empty() || path.contains(char::is_whitespace) {
		return None;
	}
	Some(path)
}

/// The server end of a draft WebSocket connection.
pub struct Connection<S>
where
	S: Stream,
{
	framed: Framed<S>,
	path: String,
	headers: Headers,
	server: Weak<ServerConfig>,
}

impl<S> Connection<S>
where
	S: Stream,
{
	/// Reads a handshake request from a fresh stream and checks it against
	/// the configuration.
	pub fn accept(stream: S, config: &Arc<ServerConfig>) -> WebSocketResult<Connection<S>> {
		Connection::from_framed(Framed::new(stream, config.traces_wire()), config)
	}

	/// Like `accept`, for a stream whose reading already started.
	///
	/// The stream is closed if the request is refused.
	pub fn from_framed(
		mut framed: Framed<S>,
		config: &Arc<ServerConfig>,
	) -> WebSocketResult<Connection<S>> {
		match read_request(&mut framed, config) {
			Ok((path, headers)) => Ok(Connection {
				framed,
				path,
				headers,
				server: Arc::downgrade(config),
			}),
			Err(e) => {
				framed.close();
				Err(e)
			}
		}
	}

	/// Answers the handshake with `status` and starts the framed exchange.
	///
	/// `Upgrade` and `Connection` always come first. An extra header named
	/// like `WebSocket-Origin` or `WebSocket-Location` replaces that value,
	/// any other is appended after them.
	pub fn respond(&mut self, status: &str, extra_headers: &[(&str, &str)]) -> WebSocketResult<()> {
		if self.framed.is_handshaked() {
			return Err(WebSocketError::AlreadyHandshaked);
		}

		let mut fields = vec![
			(WEBSOCKET_ORIGIN.to_string(), self.origin().to_string()),
			(WEBSOCKET_LOCATION.to_string(), self.location()),
		];
		for &(name, value) in extra_headers {
			match fields.iter_mut().find(|field| field.0 == name) {
				Some(field) => field.1 = value.to_string(),
				None => fields.push((name.to_string(), value.to_string())),
			}
		}

		let mut response = format!(
			"HTTP/1.1 {}\r\n{}: {}\r\n{}: {}\r\n",
			status, UPGRADE, UPGRADE_WEBSOCKET, CONNECTION, CONNECTION_UPGRADE
		);
		for (name, value) in &fields {
			response.push_str(&format!("{}: {}\r\n", name, value));
		}
		response.push_str("\r\n");

		self.framed.write_raw(response.as_bytes())?;
		self.framed.set_handshaked()
	}

	/// Answers with the default status and no extra headers.
	pub fn handshake(&mut self) -> WebSocketResult<()> {
		self.respond(DEFAULT_STATUS, &[])
	}

	/// The `Host` header of the request.
	pub fn host(&self) -> &str {
		self.headers.get(HOST).unwrap_or_default()
	}

	/// The `Origin` header of the request.
	pub fn origin(&self) -> &str {
		self.headers.get(ORIGIN).unwrap_or_default()
	}

	/// The URL this connection answers for, `ws://<host><path>`.
	pub fn location(&self) -> String {
		format!("ws://{}{}", self.host(), self.path)
	}

	/// The configuration of the server that accepted this connection, as
	/// long as that server is alive.
	pub fn server_config(&self) -> Option<Arc<ServerConfig>> {
		self.server.upgrade()
	}
}

fn read_request<S>(framed: &mut Framed<S>, config: &ServerConfig) -> WebSocketResult<(String, Headers)>
where
	S: Stream,
{
	let line = framed.read_line()?.unwrap_or_default();
	let path = match line_text(&line).and_then(request_path) {
		Some(path) => path.to_string(),
		None => {
			return Err(WebSocketError::InvalidRequest(
				String::from_utf8_lossy(&line).into_owned(),
			))
		}
	};

	let headers = framed.read_headers()?;
	headers.check_upgrade().map_err(WebSocketError::InvalidHeader)?;
	headers.require(HOST).map_err(WebSocketError::InvalidHeader)?;
	let origin = headers.require(ORIGIN).map_err(WebSocketError::InvalidHeader)?;
	config.check_origin(origin)?;

	Ok((path, headers))
}

impl<S> WebSocket for Connection<S>
where
	S: Stream,
{
	type Stream = S;

	fn role(&self) -> Role {
		Role::Server
	}

	fn path(&self) -> &str {
		&self.path
	}

	fn headers(&self) -> &Headers {
		&self.headers
	}

	fn framed(&self) -> &Framed<S> {
		&self.framed
	}

	fn framed_mut(&mut self) -> &mut Framed<S> {
		&mut self.framed
	}
}

impl<S> Connection<S>
where
	S: Splittable + Stream,
{
	/// Split a handshaked connection into its reading and writing halves.
	pub fn split(self) -> WebSocketResult<(Reader<S::Reader>, Writer<S::Writer>)> {
		self.framed.split()
	}
}

impl<S> Connection<S>
where
	S: AsTcpStream + Stream,
{
	/// See [`TcpStream::peer_addr`]
	/// (https://doc.rust-lang.org/std/net/struct.TcpStream.html#method.peer_addr).
	pub fn peer_addr(&self) -> IoResult<SocketAddr> {
		match self.framed.get_ref() {
			Some(stream) => stream.as_tcp().peer_addr(),
			None => Err(std::io::ErrorKind::NotConnected.into()),
		}
	}

	/// Shuts down the connection, will cause all pending and future IO to
	/// return immediately with an appropriate value.
	pub fn shutdown(&self) -> IoResult<()> {
		match self.framed.get_ref() {
			Some(stream) => stream.as_tcp().shutdown(Shutdown::Both),
			None => Err(std::io::ErrorKind::NotConnected.into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stream::ReadWritePair;
	use std::io::Cursor;

	type Pair = ReadWritePair<Cursor<Vec<u8>>, Vec<u8>>;

	const REQUEST: &[u8] = b"GET / HTTP/1.1\r\n\
		Upgrade: WebSocket\r\n\
		Connection: Upgrade\r\n\
		Host: localhost:10081\r\n\
		Origin: http://example.com\r\n\
		\r\n";

	fn config(domains: &[&str]) -> Arc<ServerConfig> {
		Arc::new(ServerConfig::new(10081, domains.iter().cloned()).unwrap())
	}

	fn accept(request: &[u8], domains: &[&str]) -> WebSocketResult<Connection<Pair>> {
		let stream = ReadWritePair(Cursor::new(request.to_vec()), Vec::new());
		Connection::accept(stream, &config(domains))
	}

	fn written(connection: &Connection<Pair>) -> String {
		String::from_utf8_lossy(&connection.stream_ref().unwrap().1).into_owned()
	}

	#[test]
	fn accepts_listed_origin() {
		let connection = accept(REQUEST, &["example.com"]).unwrap();
		assert_eq!(connection.role(), Role::Server);
		assert_eq!(connection.path(), "/");
		assert_eq!(connection.origin(), "http://example.com");
		assert_eq!(connection.host(), "localhost:10081");
		assert_eq!(connection.location(), "ws://localhost:10081/");
		assert!(!connection.is_handshaked());
		assert_eq!(written(&connection), "");
	}

	#[test]
	fn rejects_unlisted_origin() {
		match accept(REQUEST, &["other.com"]) {
			Err(WebSocketError::OriginRejected {
				origin,
				domain,
				accepted,
			}) => {
				assert_eq!(origin, "http://example.com");
				assert_eq!(domain, "example.com");
				assert_eq!(accepted, vec!["other.com"]);
			}
			Err(e) => panic!("unexpected {:?}", e),
			Ok(_) => panic!("origin was accepted"),
		}
	}

	#[test]
	fn only_http_1_1_gets_are_requests() {
		for line in &[
			"GET / HTTP/1.0",
			"POST / HTTP/1.1",
			"GET  HTTP/1.1",
			"GET /a b HTTP/1.1",
		] {
			let request = format!("{}\r\n\r\n", line);
			match accept(request.as_bytes(), &["*"]) {
				Err(WebSocketError::InvalidRequest(ref got)) => assert_eq!(got, line),
				Err(e) => panic!("unexpected {:?}", e),
				Ok(_) => panic!("{:?} was accepted", line),
			}
		}
		match accept(b"", &["*"]) {
			Err(WebSocketError::InvalidRequest(ref got)) => assert_eq!(got, ""),
			Err(e) => panic!("unexpected {:?}", e),
			Ok(_) => panic!("empty request was accepted"),
		}
	}

	#[test]
	fn undecodable_request_line_is_an_invalid_request() {
		match accept(b"GET /\xff\xfe HTTP/1.1\r\n\r\n", &["*"]) {
			Err(WebSocketError::InvalidRequest(ref got)) => {
				assert_eq!(got, "GET /\u{FFFD}\u{FFFD} HTTP/1.1")
			}
			Err(e) => panic!("unexpected {:?}", e),
			Ok(_) => panic!("undecodable request line was accepted"),
		}

		let request = b"GET / HTTP/1.1\r\n\
			Upgrade: WebSocket\r\n\
			X-\xff: a\r\n\
			\r\n";
		match accept(request, &["*"]) {
			Err(WebSocketError::InvalidHeader(ref why)) => assert!(why.contains("X-\u{FFFD}: a")),
			Err(e) => panic!("unexpected {:?}", e),
			Ok(_) => panic!("undecodable header was accepted"),
		}
	}

	#[test]
	fn upgrade_headers_are_required() {
		let requests: &[&[u8]] = &[
			b"GET / HTTP/1.1\r\nConnection: Upgrade\r\nHost: h\r\nOrigin: null\r\n\r\n",
			b"GET / HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nHost: h\r\nOrigin: null\r\n\r\n",
			b"GET / HTTP/1.1\r\nUpgrade: WebSocket\r\nConnection: Upgrade\r\nOrigin: null\r\n\r\n",
			b"GET / HTTP/1.1\r\nUpgrade: WebSocket\r\nConnection: Upgrade\r\nHost: h\r\n\r\n",
			b"GET / HTTP/1.1\r\nUpgrade:WebSocket\r\n\r\n",
		];
		for request in requests {
			match accept(request, &["*"]) {
				Err(WebSocketError::InvalidHeader(_)) => {}
				Err(e) => panic!("unexpected {:?}", e),
				Ok(_) => panic!("{:?} was accepted", String::from_utf8_lossy(request)),
			}
		}
	}

	#[test]
	fn headers_cut_short_are_still_checked() {
		let request = b"GET /chat HTTP/1.1\r\n\
			Upgrade: WebSocket\r\n\
			Connection: Upgrade\r\n\
			Host: h\r\n\
			Origin: null\r\n";
		let connection = accept(request, &["file://"]).unwrap();
		assert_eq!(connection.path(), "/chat");
	}

	#[test]
	fn respond_writes_the_answer() {
		let mut connection = accept(REQUEST, &["*"]).unwrap();
		connection.handshake().unwrap();
		assert!(connection.is_handshaked());
		assert_eq!(
			written(&connection),
			"HTTP/1.1 101 Web Socket Protocol Handshake\r\n\
			 Upgrade: WebSocket\r\n\
			 Connection: Upgrade\r\n\
			 WebSocket-Origin: http://example.com\r\n\
			 WebSocket-Location: ws://localhost:10081/\r\n\
			 \r\n"
		);
	}

	#[test]
	fn extra_headers_replace_or_append() {
		let mut connection = accept(REQUEST, &["*"]).unwrap();
		connection
			.respond(
				"101 Switching",
				&[
					("X-Room", "lobby"),
					("WebSocket-Location", "ws://proxy.example/"),
				],
			)
			.unwrap();
		assert_eq!(
			written(&connection),
			"HTTP/1.1 101 Switching\r\n\
			 Upgrade: WebSocket\r\n\
			 Connection: Upgrade\r\n\
			 WebSocket-Origin: http://example.com\r\n\
			 WebSocket-Location: ws://proxy.example/\r\n\
			 X-Room: lobby\r\n\
			 \r\n"
		);
	}

	#[test]
	fn respond_only_once() {
		let mut connection = accept(REQUEST, &["*"]).unwrap();
		connection.handshake().unwrap();
		match connection.handshake() {
			Err(WebSocketError::AlreadyHandshaked) => {}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn frames_wait_for_respond() {
		let mut request = REQUEST.to_vec();
		request.extend_from_slice(b"\x00hello\xff");
		let mut connection = accept(&request, &["*"]).unwrap();

		match connection.send("early") {
			Err(WebSocketError::NotHandshaked) => {}
			other => panic!("unexpected {:?}", other),
		}
		match connection.receive() {
			Err(WebSocketError::NotHandshaked) => {}
			other => panic!("unexpected {:?}", other),
		}

		connection.handshake().unwrap();
		assert_eq!(connection.receive().unwrap(), Some("hello".to_string()));
		connection.send("hello").unwrap();
		assert!(written(&connection).ends_with("\r\n\r\n\u{0}hello\u{FFFD}"));
		assert_eq!(connection.receive().unwrap(), None);
	}

	#[test]
	fn config_is_weakly_shared() {
		let config = config(&["*"]);
		let stream = ReadWritePair(Cursor::new(REQUEST.to_vec()), Vec::new());
		let connection = Connection::accept(stream, &config).unwrap();
		assert_eq!(connection.server_config().unwrap().port(), 10081);
		drop(config);
		assert!(connection.server_config().is_none());
	}
}
