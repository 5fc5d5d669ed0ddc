//! Sends each line of stdin as a message and prints every message received.
use std::io::{stdin, BufRead};
use std::process;
use std::thread;

use clap::Parser;

use websocket_hixie::ClientBuilder;

#[derive(Parser)]
#[command(name = "client", about = "A draft WebSocket client reading stdin")]
struct Cli {
	/// Server to connect to, e.g. ws://127.0.0.1:10081/
	url: String,

	/// Origin to claim instead of http://<host>
	#[arg(long)]
	origin: Option<String>,

	/// Log every handshake line and frame
	#[arg(long = "wire-trace")]
	wire_trace: bool,
}

fn main() {
	env_logger::init();
	let cli = Cli::parse();

	let mut builder = match ClientBuilder::new(&cli.url) {
		Ok(builder) => builder.wire_trace(cli.wire_trace),
		Err(e) => {
			eprintln!("{}", e);
			process::exit(2);
		}
	};
	if let Some(origin) = cli.origin {
		builder = builder.origin(origin);
	}

	let client = match builder.connect() {
		Ok(client) => client,
		Err(e) => {
			eprintln!("{}", e);
			process::exit(1);
		}
	};
	let (mut receiver, mut sender) = match client.split() {
		Ok(halves) => halves,
		Err(e) => {
			eprintln!("{}", e);
			process::exit(1);
		}
	};

	let printer = thread::spawn(move || {
		for message in receiver.incoming_messages() {
			match message {
				Ok(message) => println!("Recv: {}", message),
				Err(e) => {
					eprintln!("{}", e);
					break;
				}
			}
		}
	});

	let stdin = stdin();
	for line in stdin.lock().lines() {
		let line = match line {
			Ok(line) => line,
			Err(_) => break,
		};
		if let Err(e) = sender.send_message(&line) {
			eprintln!("{}", e);
			break;
		}
	}

	let _ = sender.shutdown_all();
	let _ = printer.join();
}
