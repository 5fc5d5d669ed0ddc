//! The result type used within websocket-hixie

use std::convert::From;
use std::error::Error;
use std::fmt;
use std::io;
use std::str::Utf8Error;
use url::ParseError;

/// The type used for WebSocket results
pub type WebSocketResult<T> = Result<T, WebSocketError>;

/// Represents a WebSocket error
#[derive(Debug)]
pub enum WebSocketError {
	/// The handshake request line was not `GET <path> HTTP/1.1`, carries the line
	InvalidRequest(String),
	/// The handshake status line was not `HTTP/1.1 101 ...`, carries the line
	BadResponse(String),
	/// A handshake header line was malformed, or a required header is missing
	/// or has the wrong value
	InvalidHeader(String),
	/// The client's origin is not covered by any accepted domain pattern
	OriginRejected {
		/// the `Origin` header sent by the client
		origin: String,
		/// the domain extracted from the origin and matched against the patterns
		domain: String,
		/// the configured accepted domain patterns
		accepted: Vec<String>,
	},
	/// The server answered with a `WebSocket-Origin` other than the one we sent
	OriginMismatch {
		/// the origin the client sent
		expected: String,
		/// the `WebSocket-Origin` the server answered with, if any
		received: Option<String>,
	},
	/// The URL scheme is neither `ws` nor `wss`
	UnsupportedScheme(String),
	/// A recognised but unimplemented feature was requested (`wss`)
	Unimplemented(&'static str),
	/// The handshake was completed already
	AlreadyHandshaked,
	/// A frame was sent or received before the handshake completed
	NotHandshaked,
	/// Invalid WebSocket data frame error
	FrameFormat(String),
	/// The server configuration is not usable
	InvalidConfig(&'static str),
	/// A connection handler panicked, carries the panic message
	HandlerPanic(String),
	/// An input/output error
	IoError(io::Error),
	/// A URL parsing error
	UrlError(ParseError),
	/// A UTF-8 error
	Utf8Error(Utf8Error),
}

impl WebSocketError {
	/// True for errors caused by the local caller misusing the API rather than
	/// by the remote peer.
	pub fn is_contract_violation(&self) -> bool {
		match *self {
			WebSocketError::AlreadyHandshaked | WebSocketError::NotHandshaked => true,
			_ => false,
		}
	}

	/// True for errors caused by the remote peer sending something this
	/// protocol does not allow.
	pub fn is_protocol_error(&self) -> bool {
		match *self {
			WebSocketError::InvalidRequest(_)
			| WebSocketError::BadResponse(_)
			| WebSocketError::InvalidHeader(_)
			| WebSocketError::OriginRejected { .. }
			| WebSocketError::OriginMismatch { .. }
			| WebSocketError::FrameFormat(_)
			| WebSocketError::Utf8Error(_) => true,
			_ => false,
		}
	}
}

impl fmt::Display for WebSocketError {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		fmt.write_str("WebSocketError: ")?;
		match self {
			WebSocketError::InvalidRequest(line) => write!(fmt, "invalid request: {:?}", line),
			WebSocketError::BadResponse(line) => write!(fmt, "bad response: {:?}", line),
			WebSocketError::InvalidHeader(why) => write!(fmt, "invalid header: {}", why),
			WebSocketError::OriginRejected {
				origin,
				domain,
				accepted,
			} => write!(
				fmt,
				"unaccepted origin: {} (accepted domains = {:?}). \
				 To accept this origin add {:?} (or \"*\") to the accepted domains",
				origin, accepted, domain
			),
			WebSocketError::OriginMismatch { expected, received } => write!(
				fmt,
				"origin doesn't match: {:?} != {:?}",
				received.as_ref().map(String::as_str).unwrap_or(""),
				expected
			),
			WebSocketError::UnsupportedScheme(scheme) => {
				write!(fmt, "unsupported scheme: {}", scheme)
			}
			WebSocketError::Unimplemented(what) => write!(fmt, "{} is unimplemented", what),
			WebSocketError::AlreadyHandshaked => {
				fmt.write_str("handshake has already been done")
			}
			WebSocketError::NotHandshaked => fmt.write_str("call handshake first"),
			WebSocketError::FrameFormat(why) => write!(fmt, "WebSocket data frame error: {}", why),
			WebSocketError::InvalidConfig(why) => write!(fmt, "invalid configuration: {}", why),
			WebSocketError::HandlerPanic(msg) => write!(fmt, "connection handler panicked: {}", msg),
			WebSocketError::IoError(e) => write!(fmt, "I/O failure: {}", e),
			WebSocketError::UrlError(e) => write!(fmt, "URL failure: {}", e),
			WebSocketError::Utf8Error(e) => write!(fmt, "UTF-8 failure: {}", e),
		}
	}
}

impl Error for WebSocketError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match *self {
			WebSocketError::IoError(ref error) => Some(error),
			WebSocketError::UrlError(ref error) => Some(error),
			WebSocketError::Utf8Error(ref error) => Some(error),
			_ => None,
		}
	}
}

impl From<io::Error> for WebSocketError {
	fn from(err: io::Error) -> WebSocketError {
		WebSocketError::IoError(err)
	}
}

impl From<ParseError> for WebSocketError {
	fn from(err: ParseError) -> WebSocketError {
		WebSocketError::UrlError(err)
	}
}

impl From<Utf8Error> for WebSocketError {
	fn from(err: Utf8Error) -> WebSocketError {
		WebSocketError::Utf8Error(err)
	}
}
