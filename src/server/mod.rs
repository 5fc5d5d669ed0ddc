//! Provides an implementation of a draft WebSocket server
//!
//! `sync::Server` accepts TCP connections and gives each its own thread.
//! Plugin socket clients asking for a cross-domain policy file are answered
//! on the same port (see `policy`). Every other connection goes through the
//! server half of the handshake in `upgrade`, which stops after the origin
//! check so that the handler decides when to answer.
use url::Url;

use crate::client::Target;
use crate::origin::{self, OriginPolicy};
use crate::result::{WebSocketError, WebSocketResult};

pub use self::sync::{ConnectionContext, ErrorObserver, LogObserver, Server};
pub use self::upgrade::{Connection, DEFAULT_STATUS};

pub mod policy;
pub mod sync;
pub mod upgrade;

/// Everything a server is configured with. It is shared read-only by all
/// connections.
#[derive(Clone, Debug)]
pub struct ServerConfig {
	host: Option<String>,
	port: u16,
	policy: OriginPolicy,
	wire_trace: bool,
}

impl ServerConfig {
	/// A server on `port` accepting origins matching any of the domain
	/// patterns, e.g. `"*"`, `"*.example.com"` or `"file://"`.
	///
	/// At least one pattern is required.
	pub fn new<I, S>(port: u16, accepted_domains: I) -> WebSocketResult<ServerConfig>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		ServerConfig {
			host: None,
			port,
			policy: OriginPolicy::new(Vec::<String>::new()),
			wire_trace: false,
		}
		.accept_domains(accepted_domains)
	}

	/// A server bound to the host and port of a `ws://host:port` URL.
	pub fn from_url<I, S>(address: &str, accepted_domains: I) -> WebSocketResult<ServerConfig>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let target = Target::from_url(&Url::parse(address)?)?;
		Ok(ServerConfig::new(target.port, accepted_domains)?.host(target.host))
	}

	/// Only listen on this host, instead of on all interfaces.
	pub fn host<H>(mut self, host: H) -> Self
	where
		H: Into<String>,
	{
		self.host = Some(host.into());
		self
	}

	/// Replaces the accepted domain patterns. At least one is required.
	pub fn accept_domains<I, S>(mut self, accepted_domains: I) -> WebSocketResult<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let policy = OriginPolicy::new(accepted_domains);
		if policy.is_empty() {
			return Err(WebSocketError::InvalidConfig(
				"at least one accepted domain is required",
			));
		}
		self.policy = policy;
		Ok(self)
	}

	/// Logs every handshake line and frame at debug level.
	pub fn wire_trace(mut self, enabled: bool) -> Self {
		self.wire_trace = enabled;
		self
	}

	/// The host the server listens on.
	pub fn bind_host(&self) -> &str {
		self.host.as_ref().map(String::as_str).unwrap_or("0.0.0.0")
	}

	/// The port the server listens on.
	pub fn port(&self) -> u16 {
		self.port
	}

	pub(crate) fn set_port(&mut self, port: u16) {
		self.port = port;
	}

	/// Whether connections trace their traffic.
	pub fn traces_wire(&self) -> bool {
		self.wire_trace
	}

	/// The accepted domain patterns, in configured order.
	pub fn accepted_domains(&self) -> Vec<String> {
		self.policy.patterns()
	}

	/// The compiled origin policy.
	pub fn policy(&self) -> &OriginPolicy {
		&self.policy
	}

	/// Checks an origin against the accepted domains.
	pub fn check_origin(&self, origin: &str) -> WebSocketResult<()> {
		if self.policy.accepts(origin) {
			return Ok(());
		}
		Err(WebSocketError::OriginRejected {
			origin: origin.to_string(),
			domain: origin::origin_to_domain(origin),
			accepted: self.accepted_domains(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn needs_an_accepted_domain() {
		match ServerConfig::new(10081, Vec::<String>::new()) {
			Err(WebSocketError::InvalidConfig(_)) => {}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn reads_host_and_port_from_url() {
		let config = ServerConfig::from_url("ws://localhost:10081", vec!["*"]).unwrap();
		assert_eq!(config.bind_host(), "localhost");
		assert_eq!(config.port(), 10081);

		let config = ServerConfig::new(8080, vec!["*"]).unwrap();
		assert_eq!(config.bind_host(), "0.0.0.0");
	}

	#[test]
	fn domains_can_be_replaced() {
		let config = ServerConfig::new(8080, vec!["*"])
			.unwrap()
			.accept_domains(vec!["example.com", "*.example.com"])
			.unwrap();
		assert_eq!(config.accepted_domains(), vec!["example.com", "*.example.com"]);
		assert!(config.check_origin("http://chat.example.com").is_ok());
		assert!(config.check_origin("http://example.org").is_err());
		assert!(config.accept_domains(Vec::<&str>::new()).is_err());
	}

	#[test]
	fn rejection_carries_the_configuration() {
		let config = ServerConfig::new(80, vec!["other.com", "file://"]).unwrap();
		assert!(config.check_origin("null").is_ok());
		match config.check_origin("http://example.com:8000") {
			Err(WebSocketError::OriginRejected {
				origin,
				domain,
				accepted,
			}) => {
				assert_eq!(origin, "http://example.com:8000");
				assert_eq!(domain, "example.com");
				assert_eq!(accepted, vec!["other.com", "file://"]);
			}
			other => panic!("unexpected {:?}", other),
		}
	}
}
