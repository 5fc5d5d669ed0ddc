//! The client side of the draft handshake.
//!
//! A client writes the upgrade request, checks the status line and the
//! headers of the answer, and is handshaked as soon as the server echoed its
//! origin back. There is no separate confirmation step on this side.
use std::io::Result as IoResult;
use std::net::{SocketAddr, TcpStream};

use url::{Position, Url};

use crate::framed::Framed;
use crate::header::{line_text, Headers, WEBSOCKET_ORIGIN};
use crate::receiver::Reader;
use crate::result::{WebSocketError, WebSocketResult};
use crate::sender::Writer;
use crate::stream::{AsTcpStream, Shutdown, Splittable, Stream};
use crate::ws::{Role, WebSocket};

pub use self::builder::ClientBuilder;

pub mod builder;

/// Every successful handshake answer starts with this.
pub const SWITCHING_PROTOCOLS: &str = "HTTP/1.1 101 ";

const DEFAULT_PORT: u16 = 80;

/// Where a `ws://` URL points to, resolved for the handshake request.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
	/// host name or address to connect to
	pub host: String,
	/// port to connect to, 80 unless the URL names another
	pub port: u16,
	/// path and query sent in the request line
	pub resource: String,
}

impl Target {
	/// Resolves a URL, refusing anything but the `ws` scheme.
	pub fn from_url(url: &Url) -> WebSocketResult<Target> {
		match url.scheme() {
			"ws" => {}
			"wss" => return Err(WebSocketError::Unimplemented("wss scheme")),
			other => return Err(WebSocketError::UnsupportedScheme(other.to_string())),
		}
		let host = url
			.host_str()
			.ok_or_else(|| WebSocketError::InvalidRequest(url.to_string()))?;
		let mut resource = url[Position::BeforePath..Position::AfterQuery].to_string();
		if resource.is_empty() || resource.starts_with('?') {
			resource.insert(0, '/');
		}
		Ok(Target {
			host: host.to_string(),
			port: url.port_or_known_default().unwrap_or(DEFAULT_PORT),
			resource,
		})
	}

	/// The `Host` header value; the port is only spelled out when it is not 80.
	pub fn host_header(&self) -> String {
		if self.port == DEFAULT_PORT {
			self.host.clone()
		} else {
			format!("{}:{}", self.host, self.port)
		}
	}

	/// The origin a client claims when none was configured.
	pub fn default_origin(&self) -> String {
		format!("http://{}", self.host)
	}
}

/// The client end of a draft WebSocket connection.
///
///```no_run
///# extern crate websocket_hixie;
///# fn main() {
///use websocket_hixie::{ClientBuilder, WebSocket};
///
///let mut client = ClientBuilder::new("ws://127.0.0.1:10081/chat")
///    .unwrap()
///    .connect()
///    .unwrap();
///
///client.send("Hello, World!").unwrap();
///while let Some(message) = client.receive().unwrap() {
///    println!("Recv: {}", message);
///}
///# }
///```
pub struct Client<S>
where
	S: Stream,
{
	framed: Framed<S>,
	target: Target,
	origin: String,
	headers: Headers,
}

impl<S> Client<S>
where
	S: Stream,
{
	/// Wraps a connected stream. Nothing is sent until `handshake` is called.
	pub fn new(stream: S, target: Target, origin: Option<String>, wire_trace: bool) -> Client<S> {
		let origin = origin.unwrap_or_else(|| target.default_origin());
		Client {
			framed: Framed::new(stream, wire_trace),
			target,
			origin,
			headers: Headers::new(),
		}
	}

	/// Performs the handshake. On failure the stream is closed.
	pub fn handshake(&mut self) -> WebSocketResult<()> {
		if self.framed.is_handshaked() {
			return Err(WebSocketError::AlreadyHandshaked);
		}
		let result = self.exchange();
		if result.is_err() {
			self.framed.close();
		}
		result
	}

	fn exchange(&mut self) -> WebSocketResult<()> {
		let request = format!(
			"GET {} HTTP/1.1\r\n\
			 Upgrade: WebSocket\r\n\
			 Connection: Upgrade\r\n\
			 Host: {}\r\n\
			 Origin: {}\r\n\
			 \r\n",
			self.target.resource,
			self.target.host_header(),
			self.origin
		);
		self.framed.write_raw(request.as_bytes())?;

		let status = self.framed.read_line()?.unwrap_or_default();
		match line_text(&status) {
			Some(line) if line.starts_with(SWITCHING_PROTOCOLS) => {}
			_ => {
				return Err(WebSocketError::BadResponse(
					String::from_utf8_lossy(&status).into_owned(),
				))
			}
		}

		let headers = self.framed.read_headers()?;
		headers.check_upgrade().map_err(WebSocketError::InvalidHeader)?;
		if headers.get(WEBSOCKET_ORIGIN) != Some(self.origin.as_str()) {
			return Err(WebSocketError::OriginMismatch {
				expected: self.origin.clone(),
				received: headers.get(WEBSOCKET_ORIGIN).map(str::to_string),
			});
		}

		self.headers = headers;
		self.framed.set_handshaked()
	}

	/// The origin sent in the handshake request.
	pub fn origin(&self) -> &str {
		&self.origin
	}

	/// The `Host` header sent in the handshake request.
	pub fn host(&self) -> String {
		self.target.host_header()
	}

	/// The resolved target of this connection.
	pub fn target(&self) -> &Target {
		&self.target
	}
}

impl<S> WebSocket for Client<S>
where
	S: Stream,
{
	type Stream = S;

	fn role(&self) -> Role {
		Role::Client
	}

	fn path(&self) -> &str {
		&self.target.resource
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

impl<S> Client<S>
where
	S: Splittable + Stream,
{
	/// Split this client into its reading and writing halves, so that one
	/// thread can wait for messages while another sends.
	///
	///```no_run
	///# extern crate websocket_hixie;
	///# fn main() {
	///use std::thread;
	///use websocket_hixie::ClientBuilder;
	///
	///let client = ClientBuilder::new("ws://127.0.0.1:10081").unwrap()
	///    .connect().unwrap();
	///
	///let (mut receiver, mut sender) = client.split().unwrap();
	///
	///thread::spawn(move || {
	///    for message in receiver.incoming_messages() {
	///        println!("Recv: {}", message.unwrap());
	///    }
	///});
	///
	///sender.send_message("Hello, World!").unwrap();
	///# }
	///```
	pub fn split(self) -> WebSocketResult<(Reader<S::Reader>, Writer<S::Writer>)> {
		self.framed.split()
	}
}

impl<S> Client<S>
where
	S: AsTcpStream + Stream,
{
	/// Shuts down the client connection, will cause all pending and future IO to
	/// return immediately with an appropriate value.
	pub fn shutdown(&self) -> IoResult<()> {
		self.tcp()?.shutdown(Shutdown::Both)
	}

	/// See [`TcpStream::peer_addr`]
	/// (https://doc.rust-lang.org/std/net/struct.TcpStream.html#method.peer_addr).
	pub fn peer_addr(&self) -> IoResult<SocketAddr> {
		self.tcp()?.peer_addr()
	}

	/// See [`TcpStream::local_addr`]
	/// (https://doc.rust-lang.org/std/net/struct.TcpStream.html#method.local_addr).
	pub fn local_addr(&self) -> IoResult<SocketAddr> {
		self.tcp()?.local_addr()
	}

	fn tcp(&self) -> IoResult<&TcpStream> {
		self.framed
			.get_ref()
			.map(AsTcpStream::as_tcp)
			.ok_or_else(|| std::io::ErrorKind::NotConnected.into())
	}
}
