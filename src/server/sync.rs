//! Provides an implementation of a WebSocket server
use std::any::Any;
use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use log::{error, info, warn};

use crate::framed::Framed;
use crate::result::{WebSocketError, WebSocketResult};
use crate::server::policy::{self, PROBE_BYTE};
use crate::server::{Connection, ServerConfig};
use crate::stream::Stream;
use crate::ws::WebSocket;

/// What is known about a connection when an error is reported.
#[derive(Clone, Debug, Default)]
pub struct ConnectionContext {
	/// the remote address, if the transport has one
	pub peer_addr: Option<SocketAddr>,
	/// the requested path, once the request line was read
	pub path: Option<String>,
	/// the declared origin, once the handshake request was accepted
	pub origin: Option<String>,
}

impl fmt::Display for ConnectionContext {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		match self.peer_addr {
			Some(ref addr) => write!(fmt, "{}", addr)?,
			None => fmt.write_str("unknown peer")?,
		}
		if let Some(ref path) = self.path {
			write!(fmt, " {}", path)?;
		}
		if let Some(ref origin) = self.origin {
			write!(fmt, " (origin {})", origin)?;
		}
		Ok(())
	}
}

/// Receives every error the server catches: failed accepts, refused
/// handshakes, handler errors and handler panics.
///
/// Any `Fn(&WebSocketError, &ConnectionContext) + Send + Sync` is an
/// observer.
pub trait ErrorObserver: Send + Sync {
	/// Called once per error, from the thread of the failing connection.
	fn observe(&self, error: &WebSocketError, context: &ConnectionContext);
}

impl<F> ErrorObserver for F
where
	F: Fn(&WebSocketError, &ConnectionContext) + Send + Sync,
{
	fn observe(&self, error: &WebSocketError, context: &ConnectionContext) {
		self(error, context)
	}
}

/// The default observer: peer defects are logged as warnings, everything
/// else as errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl ErrorObserver for LogObserver {
	fn observe(&self, error: &WebSocketError, context: &ConnectionContext) {
		if error.is_protocol_error() {
			warn!("{}: {}", context, error);
		} else {
			error!("{}: {}", context, error);
		}
	}
}

/// Represents a draft WebSocket server listening on one TCP port.
///
/// Every accepted connection gets its own thread, which answers policy-file
/// probes or reads the handshake request and hands the connection to the
/// handler.
///
///```no_run
///# extern crate websocket_hixie;
///# fn main() {
///use websocket_hixie::{Server, ServerConfig, WebSocket};
///
///let config = ServerConfig::new(10081, vec!["*"]).unwrap();
///let server = Server::bind(config).unwrap();
///
///server.run(|connection| {
///    connection.handshake()?;
///    while let Some(message) = connection.receive()? {
///        connection.send(&message)?;
///    }
///    Ok(())
///});
///# }
///```
pub struct Server {
	listener: TcpListener,
	config: Arc<ServerConfig>,
	observer: Arc<dyn ErrorObserver>,
}

impl Server {
	/// Binds to the configured host and port. Port 0 picks a free port,
	/// which is then stored in the configuration.
	pub fn bind(mut config: ServerConfig) -> WebSocketResult<Server> {
		let listener = TcpListener::bind((config.bind_host(), config.port()))?;
		let addr = listener.local_addr()?;
		config.set_port(addr.port());
		info!("listening on {}", addr);
		Ok(Server {
			listener,
			config: Arc::new(config),
			observer: Arc::new(LogObserver),
		})
	}

	/// Replaces the default `LogObserver`.
	pub fn on_error<O>(mut self, observer: O) -> Self
	where
		O: ErrorObserver + 'static,
	{
		self.observer = Arc::new(observer);
		self
	}

	/// Get the socket address of this server
	pub fn local_addr(&self) -> io::Result<SocketAddr> {
		self.listener.local_addr()
	}

	/// The configuration shared with every connection.
	pub fn config(&self) -> &Arc<ServerConfig> {
		&self.config
	}

	/// Accepts connections forever, running `handler` on its own thread for
	/// each accepted handshake request.
	///
	/// The handler decides when to `respond`. Its errors and panics are
	/// reported to the observer and end only that connection, which is
	/// closed however the handler returns. Use `incoming` and `serve` to
	/// drive a loop that can stop.
	pub fn run<H>(&self, handler: H)
	where
		H: Fn(&mut Connection<TcpStream>) -> WebSocketResult<()> + Send + Sync + 'static,
	{
		let handler = Arc::new(handler);
		for stream in self.incoming() {
			match stream {
				Ok(stream) => self.serve(stream, Arc::clone(&handler)),
				Err(e) => self.observer.observe(&e, &ConnectionContext::default()),
			}
		}
	}

	/// Iterates over accepted TCP streams. The listener stops accepting once
	/// the caller stops iterating; connections already served keep running.
	pub fn incoming(&self) -> impl Iterator<Item = WebSocketResult<TcpStream>> + '_ {
		self.listener
			.incoming()
			.map(|stream| stream.map_err(WebSocketError::from))
	}

	/// Serves one accepted stream on a new thread named `ws-conn-<peer>`.
	pub fn serve<H>(&self, stream: TcpStream, handler: Arc<H>)
	where
		H: Fn(&mut Connection<TcpStream>) -> WebSocketResult<()> + Send + Sync + 'static,
	{
		let peer_addr = stream.peer_addr().ok();
		let name = match peer_addr {
			Some(addr) => format!("ws-conn-{}", addr),
			None => "ws-conn-unknown".to_string(),
		};
		let config = Arc::clone(&self.config);
		let observer = Arc::clone(&self.observer);
		let spawned = thread::Builder::new().name(name).spawn(move || {
			handle_stream(stream, peer_addr, &config, &*observer, &*handler)
		});
		if let Err(e) = spawned {
			let context = ConnectionContext {
				peer_addr,
				..ConnectionContext::default()
			};
			self.observer.observe(&WebSocketError::IoError(e), &context);
		}
	}
}

/// Serves one accepted stream on the current thread.
///
/// A stream whose first byte is `<` gets the policy file and is closed
/// without reaching the handler. Otherwise the handshake request is read
/// and, if accepted, the handler runs. Every failure goes to `observer`.
pub fn handle_stream<S, H>(
	stream: S,
	peer_addr: Option<SocketAddr>,
	config: &Arc<ServerConfig>,
	observer: &dyn ErrorObserver,
	handler: &H,
) where
	S: Stream,
	H: Fn(&mut Connection<S>) -> WebSocketResult<()> + ?Sized,
{
	let mut context = ConnectionContext {
		peer_addr,
		..ConnectionContext::default()
	};
	let mut framed = Framed::new(stream, config.traces_wire());

	match framed.peek_byte() {
		Ok(Some(PROBE_BYTE)) => {
			info!("{}: policy file request", context);
			if let Err(e) = policy::serve(&mut framed, config) {
				observer.observe(&e, &context);
			}
			return;
		}
		Ok(_) => {}
		Err(e) => {
			observer.observe(&e, &context);
			return;
		}
	}

	let mut connection = match Connection::from_framed(framed, config) {
		Ok(connection) => connection,
		Err(e) => {
			observer.observe(&e, &context);
			return;
		}
	};
	context.path = Some(connection.path().to_string());
	context.origin = Some(connection.origin().to_string());
	info!("{}: connected", context);

	let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&mut connection)));
	match outcome {
		Ok(Ok(())) => {}
		Ok(Err(e)) => observer.observe(&e, &context),
		Err(payload) => {
			let e = WebSocketError::HandlerPanic(panic_message(&*payload));
			observer.observe(&e, &context);
		}
	}
	connection.close();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		message.to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"handler panicked".to_string()
	}
}
