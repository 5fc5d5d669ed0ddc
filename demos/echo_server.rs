//! Echoes every message back to its sender.
//!
//! Run with `RUST_LOG=debug` and `--wire-trace` to see the handshake and
//! every frame.
use clap::Parser;
use log::info;

use websocket_hixie::{Server, ServerConfig, WebSocket};

#[derive(Parser)]
#[command(name = "echo-server", about = "A draft WebSocket echo server")]
struct Cli {
	/// Port to listen on
	#[arg(short, long, default_value = "10081")]
	port: u16,

	/// Accepted origin domain pattern, may be repeated (e.g. "*.example.com")
	#[arg(long = "accept-domain", default_value = "*")]
	accept_domain: Vec<String>,

	/// Log every handshake line and frame
	#[arg(long = "wire-trace")]
	wire_trace: bool,
}

fn main() {
	env_logger::init();
	let cli = Cli::parse();

	let config = match ServerConfig::new(cli.port, &cli.accept_domain) {
		Ok(config) => config.wire_trace(cli.wire_trace),
		Err(e) => {
			eprintln!("{}", e);
			std::process::exit(2);
		}
	};
	let server = match Server::bind(config) {
		Ok(server) => server,
		Err(e) => {
			eprintln!("{}", e);
			std::process::exit(1);
		}
	};

	server.run(|connection| {
		connection.handshake()?;
		while let Some(message) = connection.receive()? {
			info!("echo {:?} on {}", message, connection.path());
			connection.send(&message)?;
		}
		Ok(())
	});
}
