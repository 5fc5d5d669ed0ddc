//! The interface shared by both ends of a connection.
//!
//! `client::Client` and `server::Connection` implement `WebSocket`. Each
//! performs its own half of the handshake and then hands frames to the same
//! `Framed` core, so sending and receiving behave identically on both sides.
use std::fmt;
use std::str;

use crate::framed::Framed;
use crate::header::Headers;
use crate::result::WebSocketResult;
use crate::stream::Stream;

/// Which side of the handshake a connection performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
	/// Sent the handshake request
	Client,
	/// Received the handshake request
	Server,
}

impl fmt::Display for Role {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Role::Client => fmt.write_str("client"),
			Role::Server => fmt.write_str("server"),
		}
	}
}

/// A connection speaking the draft WebSocket protocol.
pub trait WebSocket {
	/// The transport this connection runs over.
	type Stream: Stream;

	/// Which side of the handshake this connection is.
	fn role(&self) -> Role;

	/// The resource path of the handshake request.
	fn path(&self) -> &str;

	/// The headers received from the peer during the handshake.
	fn headers(&self) -> &Headers;

	#[doc(hidden)]
	fn framed(&self) -> &Framed<Self::Stream>;

	#[doc(hidden)]
	fn framed_mut(&mut self) -> &mut Framed<Self::Stream>;

	/// True once the handshake completed and frames may flow.
	fn is_handshaked(&self) -> bool {
		self.framed().is_handshaked()
	}

	/// True once the connection was closed, by us or by the peer.
	fn is_closed(&self) -> bool {
		self.framed().is_closed()
	}

	/// Sends a text message as one frame.
	fn send(&mut self, text: &str) -> WebSocketResult<()> {
		self.framed_mut().send(text.as_bytes())
	}

	/// Sends raw bytes as one frame. The payload must not contain `0xFF`,
	/// which would end the frame early.
	fn send_bytes(&mut self, payload: &[u8]) -> WebSocketResult<()> {
		self.framed_mut().send(payload)
	}

	/// Receives one text message.
	///
	/// `Ok(None)` means the peer closed the connection between frames.
	fn receive(&mut self) -> WebSocketResult<Option<String>> {
		match self.framed_mut().receive()? {
			Some(payload) => Ok(Some(str::from_utf8(&payload)?.to_owned())),
			None => Ok(None),
		}
	}

	/// Receives the raw payload of one frame.
	fn receive_bytes(&mut self) -> WebSocketResult<Option<Vec<u8>>> {
		self.framed_mut().receive()
	}

	/// Closes the connection. Closing an already closed connection does
	/// nothing.
	fn close(&mut self) {
		self.framed_mut().close()
	}

	/// The transport, unless the connection was closed.
	fn stream_ref(&self) -> Option<&Self::Stream> {
		self.framed().get_ref()
	}

	/// An iterator over incoming text messages, ending when the peer closes.
	fn incoming_messages(&mut self) -> IncomingMessages<'_, Self>
	where
		Self: Sized,
	{
		IncomingMessages {
			socket: self,
			done: false,
		}
	}
}

/// Iterates over the text messages received on a connection.
///
/// Yields an error at most once: a failed receive ends the iteration.
pub struct IncomingMessages<'a, W>
where
	W: WebSocket,
{
	socket: &'a mut W,
	done: bool,
}

impl<'a, W> Iterator for IncomingMessages<'a, W>
where
	W: WebSocket,
{
	type Item = WebSocketResult<String>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}
		let next = self.socket.receive().transpose();
		self.done = match next {
			Some(Ok(_)) => false,
			_ => true,
		};
		next
	}
}
