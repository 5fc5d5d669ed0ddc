//! The writing half of a split connection.

use std::io::Result as IoResult;
use std::io::Write;

use log::debug;

use crate::dataframe;
use crate::framed::WIRE_TARGET;
use crate::result::WebSocketResult;
pub use crate::stream::Shutdown;
use crate::stream::AsTcpStream;

/// This writer bundles the writing half of a stream with the frame encoder.
/// It is produced by `split()` on a handshaked connection.
pub struct Writer<W>
where
	W: Write,
{
	stream: W,
	wire_trace: bool,
}

impl<W> Writer<W>
where
	W: Write,
{
	pub(crate) fn new(stream: W, wire_trace: bool) -> Writer<W> {
		Writer { stream, wire_trace }
	}

	/// Sends a single text message.
	pub fn send_message(&mut self, text: &str) -> WebSocketResult<()> {
		self.send_bytes(text.as_bytes())
	}

	/// Sends raw bytes as one frame. The payload must not contain `0xFF`.
	pub fn send_bytes(&mut self, payload: &[u8]) -> WebSocketResult<()> {
		if self.wire_trace {
			debug!(target: WIRE_TARGET, "send> {:?}", String::from_utf8_lossy(payload));
		}
		dataframe::write_frame(&mut self.stream, payload)
	}

	/// Returns a reference to the underlying Writer.
	pub fn get_ref(&self) -> &W {
		&self.stream
	}

	/// Returns a mutable reference to the underlying Writer.
	pub fn get_mut(&mut self) -> &mut W {
		&mut self.stream
	}
}

impl<S> Writer<S>
where
	S: AsTcpStream + Write,
{
	/// Closes the sender side of the connection, will cause all pending and future IO to
	/// return immediately with an appropriate value.
	pub fn shutdown(&self) -> IoResult<()> {
		self.stream.as_tcp().shutdown(Shutdown::Write)
	}

	/// Shuts down both Sender and Receiver, will cause all pending and future IO to
	/// return immediately with an appropriate value.
	pub fn shutdown_all(&self) -> IoResult<()> {
		self.stream.as_tcp().shutdown(Shutdown::Both)
	}
}
