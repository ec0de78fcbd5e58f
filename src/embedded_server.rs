use std::net::TcpListener;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::net::GameServer;
use crate::session::GameSession;

/// A server on an ephemeral localhost port, running on its own runtime thread.
pub struct EmbeddedServer {
	port: u16,
	_handle: JoinHandle<()>,
}

impl EmbeddedServer {
	pub fn start(game: GameSession) -> std::io::Result<Self> {
		Self::start_with_tick(game, Duration::from_secs(1))
	}

	pub fn start_with_tick(game: GameSession, tick: Duration) -> std::io::Result<Self> {
		let listener = TcpListener::bind("127.0.0.1:0")?;
		listener.set_nonblocking(true)?;
		let port = listener.local_addr()?.port();

		let runtime = tokio::runtime::Builder::new_multi_thread()
			.worker_threads(2)
			.enable_all()
			.build()?;

		let (ready_tx, ready_rx) = mpsc::channel();

		let handle = thread::spawn(move || {
			runtime.block_on(async move {
				let listener = match tokio::net::TcpListener::from_std(listener) {
					Ok(listener) => listener,
					Err(e) => {
						tracing::error!(error = %e, "embedded server could not adopt listener");
						return;
					}
				};
				ready_tx.send(()).ok();
				if let Err(e) = GameServer::new(game).with_tick(tick).run_with_listener(listener).await {
					tracing::error!(error = %e, "embedded server stopped");
				}
			});
		});

		ready_rx.recv().ok();

		Ok(Self {
			port,
			_handle: handle,
		})
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn addr(&self) -> String {
		format!("127.0.0.1:{}", self.port)
	}
}
