//! Builds clients from a `ws://` URL.
use std::net::TcpStream;

use url::Url;

use super::{Client, Target};
use crate::result::WebSocketResult;
use crate::stream::Stream;

/// Build clients with a builder-style API
///
/// Only the `ws` scheme is supported. `wss` fails with `Unimplemented` and
/// any other scheme with `UnsupportedScheme`, before anything is connected.
#[derive(Clone, Debug)]
pub struct ClientBuilder {
	url: Url,
	target: Target,
	origin: Option<String>,
	wire_trace: bool,
}

impl ClientBuilder {
	/// Create a client builder from a URL string.
	pub fn new(address: &str) -> WebSocketResult<Self> {
		let url = Url::parse(address)?;
		ClientBuilder::from_url(url)
	}

	/// Create a client builder from an already parsed Url.
	pub fn from_url(url: Url) -> WebSocketResult<Self> {
		let target = Target::from_url(&url)?;
		Ok(ClientBuilder {
			url,
			target,
			origin: None,
			wire_trace: false,
		})
	}

	/// Sets the origin to claim, `http://<host>` otherwise.
	pub fn origin(mut self, origin: String) -> Self {
		self.origin = Some(origin);
		self
	}

	/// Logs every handshake line and frame at debug level.
	pub fn wire_trace(mut self, enabled: bool) -> Self {
		self.wire_trace = enabled;
		self
	}

	/// The URL this builder connects to.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Connect to the server over TCP and perform the handshake.
	pub fn connect(&self) -> WebSocketResult<Client<TcpStream>> {
		let tcp_stream = TcpStream::connect((self.target.host.as_str(), self.target.port))?;
		self.connect_on(tcp_stream)
	}

	/// Perform the handshake over an already connected stream.
	pub fn connect_on<S>(&self, stream: S) -> WebSocketResult<Client<S>>
	where
		S: Stream,
	{
		let mut client = Client::new(
			stream,
			self.target.clone(),
			self.origin.clone(),
			self.wire_trace,
		);
		client.handshake()?;
		Ok(client)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::result::WebSocketError;
	use crate::stream::ReadWritePair;
	use crate::ws::WebSocket;
	use std::io::Cursor;

	#[test]
	fn rejects_bad_urls_before_connecting() {
		match ClientBuilder::new("wss://example.com/") {
			Err(WebSocketError::Unimplemented(_)) => {}
			other => panic!("unexpected {:?}", other),
		}
		match ClientBuilder::new("ftp://example.com/") {
			Err(WebSocketError::UnsupportedScheme(ref s)) if s == "ftp" => {}
			other => panic!("unexpected {:?}", other),
		}
		match ClientBuilder::new("not a url") {
			Err(WebSocketError::UrlError(_)) => {}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn connects_on_any_stream() {
		let answer = b"HTTP/1.1 101 Web Socket Protocol Handshake\r\n\
			Upgrade: WebSocket\r\n\
			Connection: Upgrade\r\n\
			WebSocket-Origin: http://app.example\r\n\
			\r\n\
			\x00ready\xff";
		let stream = ReadWritePair(Cursor::new(answer.to_vec()), Vec::new());
		let builder = ClientBuilder::new("ws://example.com:81/feed")
			.unwrap()
			.origin("http://app.example".to_string());
		assert_eq!(builder.url().port(), Some(81));

		let mut client = builder.connect_on(stream).unwrap();
		assert!(client.is_handshaked());
		assert_eq!(client.path(), "/feed");
		assert_eq!(client.receive().unwrap(), Some("ready".to_string()));
	}
}
