use std::io::{self, BufRead, Read};
use std::str;

use super::Headers;
use crate::result::{WebSocketError, WebSocketResult};

/// Longest handshake line accepted, terminator included.
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// Reads one line and strips its terminator (`\r\n`, `\n` or a lone `\r`).
///
/// The line is returned as raw bytes; whether they form a valid request
/// line, status line or header is for the caller to decide. Returns
/// `Ok(None)` at the end of the stream. A final line without a terminator is
/// still returned.
pub fn read_line<R>(reader: &mut R) -> WebSocketResult<Option<Vec<u8>>>
where
	R: BufRead + ?Sized,
{
	read_line_with_limit(reader, MAX_LINE_LEN)
}

/// Like `read_line`, failing with `InvalidData` once `max_len` bytes were
/// read without finding the end of the line.
pub fn read_line_with_limit<R>(reader: &mut R, max_len: usize) -> WebSocketResult<Option<Vec<u8>>>
where
	R: BufRead + ?Sized,
{
	let mut line = Vec::new();
	let read = reader.take(max_len as u64).read_until(b'\n', &mut line)?;
	if read == 0 {
		return Ok(None);
	}
	if line.last() == Some(&b'\n') {
		line.pop();
	} else if read == max_len {
		return Err(io::Error::new(
			io::ErrorKind::InvalidData,
			format!("handshake line longer than {} bytes", max_len),
		)
		.into());
	}
	if line.last() == Some(&b'\r') {
		line.pop();
	}
	Ok(Some(line))
}

/// The line as text, if it is valid UTF-8.
pub fn line_text(line: &[u8]) -> Option<&str> {
	str::from_utf8(line).ok()
}

/// Splits a `<token>: <rest>` line. The token is everything before the
/// first whitespace character, which must be the space of a `": "`.
pub(crate) fn parse_header_line(line: &str) -> Option<(&str, &str)> {
	let space = line.find(|c: char| c.is_ascii_whitespace())?;
	if space < 2 || !line[space..].starts_with(' ') || !line[..space].ends_with(':') {
		return None;
	}
	Some((&line[..space - 1], &line[space + 1..]))
}

/// Collects header lines from `next_line` until a blank line or the end of
/// the stream.
pub fn read_headers<F>(mut next_line: F) -> WebSocketResult<Headers>
where
	F: FnMut() -> WebSocketResult<Option<Vec<u8>>>,
{
	let mut headers = Headers::new();
	while let Some(line) = next_line()? {
		if line.is_empty() {
			break;
		}
		match line_text(&line).and_then(parse_header_line) {
			Some((name, value)) => {
				headers.insert(name, value);
			}
			None => {
				return Err(WebSocketError::InvalidHeader(format!(
					"invalid header line: {}",
					String::from_utf8_lossy(&line)
				)))
			}
		}
	}
	Ok(headers)
}
