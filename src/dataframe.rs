//! Encoding and decoding of draft WebSocket text frames.
//!
//! A frame is a single `0x00` byte, the payload, and a single `0xFF` byte.
//! There is no length field: the end marker delimits the frame, so a payload
//! can never carry the byte `0xFF` itself. Valid UTF-8 text never does.
use std::io::{BufRead, Read, Write};

use crate::result::{WebSocketError, WebSocketResult};

/// Marks the beginning of a frame.
pub const START_BYTE: u8 = 0x00;
/// Marks the end of a frame.
pub const END_BYTE: u8 = 0xFF;

/// Frames a payload for the wire.
pub fn encode(payload: &[u8]) -> Vec<u8> {
	let mut frame = Vec::with_capacity(payload.len() + 2);
	frame.push(START_BYTE);
	frame.extend_from_slice(payload);
	frame.push(END_BYTE);
	frame
}

/// Checks that a chunk terminated by `END_BYTE` is exactly one frame and
/// returns its payload.
pub fn decode(chunk: &[u8]) -> WebSocketResult<&[u8]> {
	match chunk.split_last() {
		Some((&END_BYTE, rest)) => match rest.split_first() {
			Some((&START_BYTE, payload)) => Ok(payload),
			_ => Err(WebSocketError::FrameFormat(format!(
				"input must start with \\x00: {}",
				String::from_utf8_lossy(chunk)
			))),
		},
		_ => Err(WebSocketError::FrameFormat(format!(
			"input must end with \\xff: {}",
			String::from_utf8_lossy(chunk)
		))),
	}
}

/// Writes one frame and flushes the writer.
pub fn write_frame<W>(writer: &mut W, payload: &[u8]) -> WebSocketResult<()>
where
	W: Write + ?Sized,
{
	writer.write_all(&encode(payload))?;
	writer.flush()?;
	Ok(())
}

/// Largest frame payload `read_frame` accepts.
pub const MAX_PAYLOAD_LEN: usize = 1024 * 1024 * 100;

/// Reads the next frame from a buffered reader.
///
/// Returns `Ok(None)` when the stream ends before any byte of a new frame
/// arrived. A frame cut short by the end of the stream is a `FrameFormat`
/// error, as is any chunk not shaped `0x00 <payload> 0xFF`.
pub fn read_frame<R>(reader: &mut R) -> WebSocketResult<Option<Vec<u8>>>
where
	R: BufRead + ?Sized,
{
	read_frame_with_limit(reader, MAX_PAYLOAD_LEN)
}

/// Like `read_frame`, failing with `FrameFormat` once a payload grows past
/// `max_payload_len` bytes.
pub fn read_frame_with_limit<R>(
	reader: &mut R,
	max_payload_len: usize,
) -> WebSocketResult<Option<Vec<u8>>>
where
	R: BufRead + ?Sized,
{
	let limit = max_payload_len + 2;
	let mut chunk = Vec::new();
	let read = reader.take(limit as u64).read_until(END_BYTE, &mut chunk)?;
	if read == 0 {
		return Ok(None);
	}
	if chunk.last() != Some(&END_BYTE) {
		if read == limit {
			return Err(WebSocketError::FrameFormat(format!(
				"frame payload longer than {} bytes",
				max_payload_len
			)));
		}
		return Err(WebSocketError::FrameFormat(format!(
			"stream closed inside a frame after {} bytes",
			chunk.len()
		)));
	}

	decode(&chunk).map(|payload| Some(payload.to_vec()))
}
