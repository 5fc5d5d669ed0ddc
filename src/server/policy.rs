//! Answers cross-domain policy-file probes.
//!
//! Flash socket clients open the port and send `<policy-file-request/>`
//! before any handshake. A WebSocket request never starts with `<`, so the
//! first byte tells both apart.
use std::fmt::Write as FmtWrite;

use crate::framed::Framed;
use crate::origin::FILE_DOMAIN;
use crate::result::WebSocketResult;
use crate::server::ServerConfig;
use crate::stream::Stream;

/// The first byte of a policy-file probe.
pub const PROBE_BYTE: u8 = b'<';

/// The policy document allowing every accepted domain on the server port.
pub fn policy_file(config: &ServerConfig) -> String {
	let mut xml = String::from(
		"<?xml version=\"1.0\"?>\n\
		 <!DOCTYPE cross-domain-policy SYSTEM \
		 \"http://www.macromedia.com/xml/dtds/cross-domain-policy.dtd\">\n\
		 <cross-domain-policy>\n",
	);
	for domain in config.policy().iter().filter(|d| *d != FILE_DOMAIN) {
		let _ = writeln!(
			xml,
			"<allow-access-from domain=\"{}\" to-ports=\"{}\"/>",
			domain,
			config.port()
		);
	}
	xml.push_str("</cross-domain-policy>\n");
	xml
}

/// Writes the policy document and closes the stream.
pub fn serve<S>(framed: &mut Framed<S>, config: &ServerConfig) -> WebSocketResult<()>
where
	S: Stream,
{
	let result = framed.write_raw(policy_file(config).as_bytes());
	framed.close();
	result
}
