//! The buffered stream and handshake state shared by client and server
//! connections.
use std::io::{self, BufRead, BufReader, Chain, Cursor, Read, Write};

use log::debug;

use crate::dataframe;
use crate::header::{self, Headers};
use crate::receiver::Reader;
use crate::result::{WebSocketError, WebSocketResult};
use crate::sender::Writer;
use crate::stream::{Splittable, Stream};

/// Log target of the wire trace.
pub const WIRE_TARGET: &str = "websocket_hixie::wire";

/// A reader that first yields bytes already buffered before a split.
pub type Rejoined<R> = BufReader<Chain<Cursor<Vec<u8>>, R>>;

/// Owns the transport of one connection.
///
/// Handshake code reads lines through it, and once the handshake is marked
/// complete it carries frames. Closing drops the transport; every later
/// operation fails with `NotConnected`.
pub struct Framed<S>
where
	S: Stream,
{
	stream: Option<BufReader<S>>,
	handshaked: bool,
	wire_trace: bool,
}

impl<S> Framed<S>
where
	S: Stream,
{
	/// Wraps a fresh stream. `wire_trace` logs every line and frame at debug
	/// level under the `websocket_hixie::wire` target.
	pub fn new(stream: S, wire_trace: bool) -> Framed<S> {
		Framed::from_reader(BufReader::new(stream), wire_trace)
	}

	/// Wraps a stream that is already buffered, keeping what was buffered.
	pub fn from_reader(reader: BufReader<S>, wire_trace: bool) -> Framed<S> {
		Framed {
			stream: Some(reader),
			handshaked: false,
			wire_trace,
		}
	}

	/// True once the handshake completed.
	pub fn is_handshaked(&self) -> bool {
		self.handshaked
	}

	/// Marks the handshake complete; fails if it already was.
	pub fn set_handshaked(&mut self) -> WebSocketResult<()> {
		if self.handshaked {
			return Err(WebSocketError::AlreadyHandshaked);
		}
		self.handshaked = true;
		Ok(())
	}

	/// True once the stream was closed.
	pub fn is_closed(&self) -> bool {
		self.stream.is_none()
	}

	/// Whether lines and frames are traced.
	pub fn wire_trace(&self) -> bool {
		self.wire_trace
	}

	/// The underlying stream, if still open.
	pub fn get_ref(&self) -> Option<&S> {
		self.stream.as_ref().map(BufReader::get_ref)
	}

	fn stream(&mut self) -> WebSocketResult<&mut BufReader<S>> {
		match self.stream {
			Some(ref mut stream) => Ok(stream),
			None => Err(io::Error::new(io::ErrorKind::NotConnected, "connection is closed").into()),
		}
	}

	/// Looks at the next byte without consuming it.
	pub fn peek_byte(&mut self) -> WebSocketResult<Option<u8>> {
		let buf = self.stream()?.fill_buf()?;
		Ok(buf.first().cloned())
	}

	/// Reads one raw handshake line without its terminator.
	pub fn read_line(&mut self) -> WebSocketResult<Option<Vec<u8>>> {
		let line = header::read_line(self.stream()?)?;
		if self.wire_trace {
			let text = line.as_ref().map(|l| String::from_utf8_lossy(l));
			debug!(target: WIRE_TARGET, "recv> {:?}", text);
		}
		Ok(line)
	}

	/// Reads handshake headers up to the blank line.
	pub fn read_headers(&mut self) -> WebSocketResult<Headers> {
		header::read_headers(|| self.read_line())
	}

	/// Writes raw handshake bytes and flushes.
	pub fn write_raw(&mut self, data: &[u8]) -> WebSocketResult<()> {
		if self.wire_trace {
			for line in data.split_inclusive(|&b| b == b'\n') {
				debug!(target: WIRE_TARGET, "send> {:?}", String::from_utf8_lossy(line));
			}
		}
		let stream = self.stream()?.get_mut();
		stream.write_all(data)?;
		stream.flush()?;
		Ok(())
	}

	/// Sends one frame.
	pub fn send(&mut self, payload: &[u8]) -> WebSocketResult<()> {
		if !self.handshaked {
			return Err(WebSocketError::NotHandshaked);
		}
		if self.wire_trace {
			debug!(target: WIRE_TARGET, "send> {:?}", String::from_utf8_lossy(payload));
		}
		dataframe::write_frame(self.stream()?.get_mut(), payload)
	}

	/// Receives one frame, `None` once the peer closed the stream.
	///
	/// The stream is closed when the peer closes it or sends a malformed
	/// frame.
	pub fn receive(&mut self) -> WebSocketResult<Option<Vec<u8>>> {
		if !self.handshaked {
			return Err(WebSocketError::NotHandshaked);
		}
		let frame = dataframe::read_frame(self.stream()?);
		if self.wire_trace {
			if let Ok(ref frame) = frame {
				let text = frame.as_ref().map(|p| String::from_utf8_lossy(p));
				debug!(target: WIRE_TARGET, "recv> {:?}", text);
			}
		}
		match frame {
			Ok(Some(payload)) => Ok(Some(payload)),
			other => {
				self.close();
				other
			}
		}
	}

	/// Flushes and drops the stream. Closing twice is a no-op.
	pub fn close(&mut self) {
		if let Some(mut stream) = self.stream.take() {
			let _ = stream.get_mut().flush();
		}
	}

	/// Gives back the stream and whatever was read but not consumed.
	pub fn into_parts(mut self) -> Option<(S, Vec<u8>)> {
		self.stream.take().map(|reader| {
			let buffered = reader.buffer().to_vec();
			(reader.into_inner(), buffered)
		})
	}
}

impl<S> Framed<S>
where
	S: Stream + Splittable,
{
	/// Splits a handshaked connection into a frame reader and a frame writer
	/// that can live on different threads.
	pub fn split(self) -> WebSocketResult<(Reader<S::Reader>, Writer<S::Writer>)> {
		if !self.handshaked {
			return Err(WebSocketError::NotHandshaked);
		}
		let wire_trace = self.wire_trace;
		let (stream, buffered) = match self.into_parts() {
			Some(parts) => parts,
			None => {
				return Err(
					io::Error::new(io::ErrorKind::NotConnected, "connection is closed").into(),
				)
			}
		};
		let (read, write) = stream.split()?;
		let rejoined: Rejoined<S::Reader> = BufReader::new(Cursor::new(buffered).chain(read));
		Ok((
			Reader::new(rejoined, wire_trace),
			Writer::new(write, wire_trace),
		))
	}
}

impl<S> Drop for Framed<S>
where
	S: Stream,
{
	fn drop(&mut self) {
		self.close();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stream::ReadWritePair;

	type Pair = ReadWritePair<Cursor<Vec<u8>>, Vec<u8>>;

	fn framed(input: &[u8]) -> Framed<Pair> {
		Framed::new(ReadWritePair(Cursor::new(input.to_vec()), Vec::new()), false)
	}

	#[test]
	fn frames_need_a_handshake() {
		let mut framed = framed(b"\x00hi\xff");
		match framed.send(b"hi") {
			Err(WebSocketError::NotHandshaked) => {}
			other => panic!("unexpected {:?}", other),
		}
		match framed.receive() {
			Err(WebSocketError::NotHandshaked) => {}
			other => panic!("unexpected {:?}", other),
		}

		framed.set_handshaked().unwrap();
		assert_eq!(framed.receive().unwrap(), Some(b"hi".to_vec()));
		match framed.set_handshaked() {
			Err(WebSocketError::AlreadyHandshaked) => {}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn peek_does_not_consume() {
		let mut framed = framed(b"GET / HTTP/1.1\r\n");
		assert_eq!(framed.peek_byte().unwrap(), Some(b'G'));
		assert_eq!(framed.read_line().unwrap(), Some(b"GET / HTTP/1.1".to_vec()));
		assert_eq!(framed.peek_byte().unwrap(), None);
	}

	#[test]
	fn end_of_stream_closes() {
		let mut framed = framed(b"");
		framed.set_handshaked().unwrap();
		assert_eq!(framed.receive().unwrap(), None);
		assert!(framed.is_closed());
		match framed.send(b"late") {
			Err(WebSocketError::IoError(ref e)) if e.kind() == io::ErrorKind::NotConnected => {}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn bad_frame_closes() {
		let mut framed = framed(b"\x00cut sho");
		framed.set_handshaked().unwrap();
		match framed.receive() {
			Err(WebSocketError::FrameFormat(_)) => {}
			other => panic!("unexpected {:?}", other),
		}
		assert!(framed.is_closed());
	}

	#[test]
	fn close_is_idempotent() {
		let mut framed = framed(b"");
		framed.close();
		framed.close();
		assert!(framed.is_closed());
		assert!(framed.get_ref().is_none());
	}

	#[test]
	fn split_keeps_buffered_frames() {
		let mut framed = framed(b"\x00one\xff\x00two\xff");
		framed.set_handshaked().unwrap();
		assert_eq!(framed.receive().unwrap(), Some(b"one".to_vec()));

		let (mut reader, mut writer) = framed.split().unwrap();
		assert_eq!(reader.recv_message().unwrap(), Some("two".to_string()));
		assert_eq!(reader.recv_message().unwrap(), None);

		writer.send_message("back").unwrap();
		assert_eq!(writer.get_ref(), &b"\x00back\xff".to_vec());
	}

	#[test]
	fn split_needs_a_handshake() {
		match framed(b"").split() {
			Err(WebSocketError::NotHandshaked) => {}
			Err(e) => panic!("unexpected {:?}", e),
			Ok(_) => panic!("split before handshake"),
		}
	}
}
