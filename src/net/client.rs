use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::net::protocol::*;
use crate::session::{GameSnapshot, Selection};

/// Blocking client used by the CLI and tests.
pub struct GameClient {
	stream: TcpStream,
	rx: Receiver<ServerMessage>,
}

impl GameClient {
	pub fn connect(addr: &str) -> io::Result<Self> {
		let stream = TcpStream::connect(addr)?;
		stream.set_read_timeout(Some(Duration::from_millis(100)))?;

		let reader = stream.try_clone()?;
		let (tx, rx) = mpsc::channel();

		thread::spawn(move || {
			read_loop(reader, tx);
		});

		Ok(Self { stream, rx })
	}

	pub fn send(&mut self, msg: &ClientMessage) -> io::Result<()> {
		let data = encode_message(msg).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
		self.stream.write_all(&data)
	}

	pub fn try_recv(&self) -> Option<ServerMessage> {
		self.rx.try_recv().ok()
	}

	pub fn recv(&self) -> Option<ServerMessage> {
		self.rx.recv().ok()
	}

	pub fn recv_timeout(&self, timeout: Duration) -> Option<ServerMessage> {
		self.rx.recv_timeout(timeout).ok()
	}

	/// Drops messages until `accept` picks one, or `timeout` runs out.
	pub fn recv_until<F>(&self, timeout: Duration, mut accept: F) -> Option<ServerMessage>
	where
		F: FnMut(&ServerMessage) -> bool,
	{
		let deadline = Instant::now() + timeout;
		loop {
			let left = deadline.checked_duration_since(Instant::now())?;
			let msg = self.recv_timeout(left)?;
			if accept(&msg) {
				return Some(msg);
			}
		}
	}

	/// Waits for the first snapshot satisfying `accept`.
	pub fn wait_for_update<F>(&self, timeout: Duration, mut accept: F) -> Option<GameSnapshot>
	where
		F: FnMut(&GameSnapshot) -> bool,
	{
		let msg = self.recv_until(timeout, |msg| match msg {
			ServerMessage::GameUpdate { snapshot } => accept(snapshot),
			_ => false,
		})?;
		match msg {
			ServerMessage::GameUpdate { snapshot } => Some(*snapshot),
			_ => None,
		}
	}

	pub fn join_game(&mut self, name: &str) -> io::Result<()> {
		self.send(&ClientMessage::JoinGame {
			name: name.to_string(),
		})
	}

	pub fn start_naming(&mut self) -> io::Result<()> {
		self.send(&ClientMessage::StartPhase0)
	}

	pub fn submit_talent_name(&mut self, name: &str) -> io::Result<()> {
		self.send(&ClientMessage::SubmitTalentName {
			name: name.to_string(),
		})
	}

	pub fn start_production(&mut self) -> io::Result<()> {
		self.send(&ClientMessage::StartPhase1)
	}

	pub fn select_card(&mut self, index: usize) -> io::Result<()> {
		self.send(&ClientMessage::SelectCard {
			index: Selection::Card(index),
		})
	}

	pub fn pass(&mut self) -> io::Result<()> {
		self.send(&ClientMessage::SelectCard {
			index: Selection::Pass,
		})
	}

	pub fn submit_bid(&mut self, bid_amount: i64) -> io::Result<()> {
		self.send(&ClientMessage::SubmitBid { bid_amount })
	}

	pub fn toggle_role(&mut self, index: i64) -> io::Result<()> {
		self.send(&ClientMessage::ToggleRole { index })
	}

	pub fn greenlight(&mut self, role_indices: &[i64], title: &str, teaser: &str) -> io::Result<()> {
		self.send(&ClientMessage::GreenlightFilm {
			role_indices: role_indices.to_vec(),
			title: title.to_string(),
			teaser: teaser.to_string(),
		})
	}

	pub fn finish_packaging(&mut self) -> io::Result<()> {
		self.send(&ClientMessage::FinishPackaging)
	}

	pub fn vote(&mut self, nominee_index: usize) -> io::Result<()> {
		self.send(&ClientMessage::VoteForNominee { nominee_index })
	}

	pub fn continue_to_summer(&mut self) -> io::Result<()> {
		self.send(&ClientMessage::ContinueToSummer)
	}

	pub fn start_awards(&mut self) -> io::Result<()> {
		self.send(&ClientMessage::StartAwards)
	}

	pub fn continue_after_bidding(&mut self) -> io::Result<()> {
		self.send(&ClientMessage::ContinueAfterBidding)
	}

	pub fn continue_from_awards(&mut self) -> io::Result<()> {
		self.send(&ClientMessage::ContinueFromAwards)
	}

	pub fn request_update(&mut self) -> io::Result<()> {
		self.send(&ClientMessage::RequestUpdate)
	}

	pub fn heartbeat(&mut self, name: Option<&str>) -> io::Result<()> {
		self.send(&ClientMessage::Heartbeat {
			name: name.map(str::to_string),
		})
	}

	/// Closes both directions; the reader thread sees EOF and exits.
	pub fn disconnect(self) -> io::Result<()> {
		self.stream.shutdown(Shutdown::Both)
	}
}

fn read_loop(mut reader: TcpStream, tx: Sender<ServerMessage>) {
	let mut buf = vec![0u8; 4096];
	let mut pending = Vec::new();

	loop {
		match reader.read(&mut buf) {
			Ok(0) => break,
			Ok(n) => {
				pending.extend_from_slice(&buf[..n]);
				while let Some(decoded) = try_decode_message::<ServerMessage>(&mut pending) {
					match decoded {
						Ok(msg) => {
							if tx.send(msg).is_err() {
								return;
							}
						}
						Err(FrameError::TooLarge { len, .. }) => {
							tracing::warn!(target: "moguls::net", len, "server frame too large, closing");
							return;
						}
						Err(e) => {
							tracing::debug!(target: "moguls::net", error = %e, "skipping undecodable server frame");
						}
					}
				}
			}
			Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
				continue;
			}
			Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
				continue;
			}
			Err(_) => break,
		}
	}
}
