//! The transports a connection can run over.

use std::io::{self, Read, Write};
pub use std::net::Shutdown;
pub use std::net::TcpStream;
use std::ops::Deref;

/// Anything a connection can read handshake lines and frames from and write
/// them to: a `TcpStream`, a unix socket, an in-memory buffer.
pub trait Stream: Read + Write {}
impl<S> Stream for S where S: Read + Write {}

/// Joins an input and an output into one stream, e.g. a `Cursor` holding the
/// peer's bytes and a `Vec` collecting ours.
pub struct ReadWritePair<R, W>(pub R, pub W)
where
	R: Read,
	W: Write;

impl<R, W> Read for ReadWritePair<R, W>
where
	R: Read,
	W: Write,
{
	#[inline(always)]
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.0.read(buf)
	}
}

impl<R, W> Write for ReadWritePair<R, W>
where
	R: Read,
	W: Write,
{
	#[inline(always)]
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.1.write(buf)
	}
	#[inline(always)]
	fn flush(&mut self) -> io::Result<()> {
		self.1.flush()
	}
}

/// Streams that can be torn into a reading and a writing half, so frames can
/// be read on one thread while another sends.
pub trait Splittable {
	/// The reading component of this type
	type Reader: Read;
	/// The writing component of this type
	type Writer: Write;

	/// Split apart this type into a reading and writing component.
	fn split(self) -> io::Result<(Self::Reader, Self::Writer)>;
}

impl<R, W> Splittable for ReadWritePair<R, W>
where
	R: Read,
	W: Write,
{
	type Reader = R;
	type Writer = W;

	fn split(self) -> io::Result<(R, W)> {
		Ok((self.0, self.1))
	}
}

impl Splittable for TcpStream {
	type Reader = TcpStream;
	type Writer = TcpStream;

	fn split(self) -> io::Result<(TcpStream, TcpStream)> {
		self.try_clone().map(|s| (s, self))
	}
}

/// Streams backed by a `TcpStream`, for addresses and shutdown.
pub trait AsTcpStream {
	/// Get a borrow of the TcpStream
	fn as_tcp(&self) -> &TcpStream;
}

impl AsTcpStream for TcpStream {
	fn as_tcp(&self) -> &TcpStream {
		self
	}
}

impl<T> AsTcpStream for Box<T>
where
	T: AsTcpStream + ?Sized,
{
	fn as_tcp(&self) -> &TcpStream {
		self.deref().as_tcp()
	}
}
