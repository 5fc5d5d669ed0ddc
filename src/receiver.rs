//! The reading half of a split connection.

use std::io::Read;
use std::io::Result as IoResult;
use std::str;

use log::debug;

use crate::dataframe;
use crate::framed::{Rejoined, WIRE_TARGET};
use crate::result::WebSocketResult;
pub use crate::stream::Shutdown;
use crate::stream::AsTcpStream;

/// This reader bundles the reading half of a stream with the frame decoder.
/// It is produced by `split()` on a handshaked connection.
pub struct Reader<R>
where
	R: Read,
{
	stream: Rejoined<R>,
	wire_trace: bool,
}

impl<R> Reader<R>
where
	R: Read,
{
	pub(crate) fn new(stream: Rejoined<R>, wire_trace: bool) -> Reader<R> {
		Reader { stream, wire_trace }
	}

	/// Reads the payload of a single frame, `None` once the peer closed.
	pub fn recv_bytes(&mut self) -> WebSocketResult<Option<Vec<u8>>> {
		let frame = dataframe::read_frame(&mut self.stream)?;
		if self.wire_trace {
			debug!(
				target: WIRE_TARGET,
				"recv> {:?}",
				frame.as_ref().map(|p| String::from_utf8_lossy(p))
			);
		}
		Ok(frame)
	}

	/// Reads a single text message.
	pub fn recv_message(&mut self) -> WebSocketResult<Option<String>> {
		match self.recv_bytes()? {
			Some(payload) => Ok(Some(str::from_utf8(&payload)?.to_owned())),
			None => Ok(None),
		}
	}

	/// An iterator over incoming messages, ending when the peer closes.
	pub fn incoming_messages(&mut self) -> MessageIterator<'_, R> {
		MessageIterator {
			reader: self,
			done: false,
		}
	}
}

impl<R> Reader<R>
where
	R: AsTcpStream + Read,
{
	/// Closes the receiver side of the connection, will cause all pending and future IO to
	/// return immediately with an appropriate value.
	pub fn shutdown(&self) -> IoResult<()> {
		self.stream.get_ref().get_ref().1.as_tcp().shutdown(Shutdown::Read)
	}

	/// Shuts down both Sender and Receiver, will cause all pending and future IO to
	/// return immediately with an appropriate value.
	pub fn shutdown_all(&self) -> IoResult<()> {
		self.stream.get_ref().get_ref().1.as_tcp().shutdown(Shutdown::Both)
	}
}

/// Iterates over the text messages of a `Reader`.
///
/// Yields an error at most once: a failed read ends the iteration.
pub struct MessageIterator<'a, R>
where
	R: Read,
{
	reader: &'a mut Reader<R>,
	done: bool,
}

impl<'a, R> Iterator for MessageIterator<'a, R>
where
	R: Read,
{
	type Item = WebSocketResult<String>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}
		let next = self.reader.recv_message().transpose();
		self.done = match next {
			Some(Ok(_)) => false,
			_ => true,
		};
		next
	}
}
