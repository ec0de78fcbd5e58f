use std::collections::HashMap;
use std::io;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;

use crate::error::{GameError, GameResult};
use crate::logging;
use crate::net::protocol::*;
use crate::session::{GameSession, JoinOutcome, SessionId};

type ConnectionId = u64;

/// What connection tasks report to the session owner.
#[derive(Debug)]
enum Inbound {
	Connected {
		conn: ConnectionId,
		outbound: UnboundedSender<ServerMessage>,
	},
	Message {
		conn: ConnectionId,
		msg: ClientMessage,
	},
	Malformed {
		conn: ConnectionId,
		reason: String,
	},
	Disconnected {
		conn: ConnectionId,
	},
}

struct Connection {
	outbound: UnboundedSender<ServerMessage>,
}

impl Connection {
	fn send(&self, msg: ServerMessage) {
		// A closed channel means the writer is gone; the disconnect follows.
		let _ = self.outbound.send(msg);
	}
}

/// How an accepted action is answered.
#[derive(Debug, PartialEq, Eq)]
enum Reply {
	/// Everyone gets the new snapshot.
	Broadcast,
	/// `joined` to the sender, then a broadcast.
	Joined(JoinOutcome),
	/// Snapshot to the sender only.
	Update,
	Silent,
}

pub struct GameServer {
	game: GameSession,
	tick: Duration,
}

impl GameServer {
	pub fn new(game: GameSession) -> Self {
		Self {
			game,
			tick: Duration::from_secs(1),
		}
	}

	/// Interval between liveness sweeps. Zero is bumped to one millisecond.
	pub fn with_tick(mut self, tick: Duration) -> Self {
		self.tick = tick.max(Duration::from_millis(1));
		self
	}

	pub async fn run(self, addr: &str) -> io::Result<()> {
		let listener = TcpListener::bind(addr).await?;
		logging::net::listening(&listener.local_addr()?.to_string());
		self.run_with_listener(listener).await
	}

	pub async fn run_with_listener(self, listener: TcpListener) -> io::Result<()> {
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		let actor = SessionActor {
			game: self.game,
			connections: HashMap::new(),
		};
		tokio::spawn(actor.run(self.tick, inbound_rx));

		let mut next_conn_id: ConnectionId = 1;
		loop {
			match listener.accept().await {
				Ok((stream, peer)) => {
					let conn_id = next_conn_id;
					next_conn_id += 1;
					logging::net::connected(conn_id, &peer.to_string());
					tokio::spawn(handle_connection(conn_id, stream, inbound_tx.clone()));
				}
				Err(e) => {
					tracing::warn!(target: "moguls::net", error = %e, "accept failed");
				}
			}
		}
	}
}

async fn handle_connection(conn_id: ConnectionId, stream: TcpStream, inbound: UnboundedSender<Inbound>) {
	let (reader, writer) = stream.into_split();
	let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

	if inbound
		.send(Inbound::Connected {
			conn: conn_id,
			outbound: outbound_tx,
		})
		.is_err()
	{
		return;
	}

	let writer_task = tokio::spawn(write_loop(conn_id, writer, outbound_rx));
	read_loop(conn_id, reader, &inbound).await;

	let _ = inbound.send(Inbound::Disconnected { conn: conn_id });
	writer_task.abort();
	logging::net::closed(conn_id);
}

async fn read_loop(conn_id: ConnectionId, mut reader: OwnedReadHalf, inbound: &UnboundedSender<Inbound>) {
	let mut buf = vec![0u8; 4096];
	let mut pending = Vec::new();

	loop {
		match reader.read(&mut buf).await {
			Ok(0) => return,
			Ok(n) => {
				pending.extend_from_slice(&buf[..n]);
				while let Some(decoded) = try_decode_message::<ClientMessage>(&mut pending) {
					let event = match decoded {
						Ok(msg) => {
							logging::net::frame(conn_id, msg.kind());
							Inbound::Message { conn: conn_id, msg }
						}
						Err(e @ FrameError::TooLarge { .. }) => {
							logging::net::malformed(conn_id, &e.to_string());
							return;
						}
						Err(e) => Inbound::Malformed {
							conn: conn_id,
							reason: e.to_string(),
						},
					};
					if inbound.send(event).is_err() {
						return;
					}
				}
			}
			Err(_) => return,
		}
	}
}

async fn write_loop(conn_id: ConnectionId, mut writer: OwnedWriteHalf, mut outbound: UnboundedReceiver<ServerMessage>) {
	while let Some(msg) = outbound.recv().await {
		let data = match encode_message(&msg) {
			Ok(data) => data,
			Err(e) => {
				tracing::error!(target: "moguls::net", conn = conn_id, error = %e, "could not encode outbound message");
				continue;
			}
		};
		if writer.write_all(&data).await.is_err() {
			return;
		}
	}
}

/// Sole owner of the game. Every mutation happens here, one message at a time.
struct SessionActor {
	game: GameSession,
	connections: HashMap<ConnectionId, Connection>,
}

impl SessionActor {
	async fn run(mut self, tick: Duration, mut inbound: UnboundedReceiver<Inbound>) {
		let mut ticker = tokio::time::interval(tick);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				event = inbound.recv() => match event {
					Some(event) => self.handle(event),
					None => return,
				},
				_ = ticker.tick() => {
					if self.game.expire_idle(Utc::now()) {
						self.broadcast();
					}
				}
			}
		}
	}

	fn handle(&mut self, event: Inbound) {
		match event {
			Inbound::Connected { conn, outbound } => {
				self.connections.insert(conn, Connection { outbound });
			}
			Inbound::Message { conn, msg } => self.process(conn, msg),
			Inbound::Malformed { conn, reason } => {
				logging::net::malformed(conn, &reason);
				self.send_to(conn, ServerMessage::Error { message: reason });
			}
			Inbound::Disconnected { conn } => {
				self.connections.remove(&conn);
				if self.game.disconnect(SessionId(conn), Utc::now()) {
					self.broadcast();
				}
			}
		}
	}

	fn process(&mut self, conn: ConnectionId, msg: ClientMessage) {
		let session = SessionId(conn);
		match process_message(&mut self.game, session, &msg, Utc::now()) {
			Ok(Reply::Broadcast) => self.broadcast(),
			Ok(Reply::Joined(_)) => {
				self.send_to(conn, ServerMessage::Joined);
				self.broadcast();
			}
			Ok(Reply::Update) => {
				let update = self.update();
				self.send_to(conn, update);
			}
			Ok(Reply::Silent) => {}
			Err(err) => {
				logging::session::rejected(session.0, msg.kind(), &err.to_string());
				self.send_to(conn, msg.rejection(&err));
			}
		}
	}

	fn update(&self) -> ServerMessage {
		ServerMessage::GameUpdate {
			snapshot: Box::new(self.game.snapshot()),
		}
	}

	fn send_to(&self, conn: ConnectionId, msg: ServerMessage) {
		if let Some(connection) = self.connections.get(&conn) {
			connection.send(msg);
		}
	}

	fn broadcast(&self) {
		let update = self.update();
		for connection in self.connections.values() {
			connection.send(update.clone());
		}
	}
}

fn process_message(
	game: &mut GameSession,
	session: SessionId,
	msg: &ClientMessage,
	now: DateTime<Utc>,
) -> GameResult<Reply> {
	match msg {
		ClientMessage::JoinGame { name } => {
			let outcome = game.join(session, name, now)?;
			return Ok(Reply::Joined(outcome));
		}
		ClientMessage::RequestUpdate => return Ok(Reply::Update),
		ClientMessage::Heartbeat { .. } => {
			game.heartbeat(session, now);
			return Ok(Reply::Silent);
		}
		_ => {}
	}

	if game.player_for(session).is_none() {
		return Err(GameError::NotJoined);
	}
	game.heartbeat(session, now);

	match msg {
		ClientMessage::StartPhase0 => game.start_naming()?,
		ClientMessage::SubmitTalentName { name } => game.submit_talent_name(session, name)?,
		ClientMessage::StartPhase1 => game.start_production()?,
		ClientMessage::SelectCard { index } => game.select_card(session, *index)?,
		ClientMessage::SubmitBid { bid_amount } => game.submit_bid(session, *bid_amount)?,
		ClientMessage::ToggleRole { index } => game.toggle_role(session, *index)?,
		ClientMessage::GreenlightFilm {
			role_indices,
			title,
			teaser,
		} => game.greenlight(session, role_indices, title, teaser)?,
		ClientMessage::FinishPackaging => game.finish_packaging(session)?,
		ClientMessage::VoteForNominee { nominee_index } => game.vote(session, *nominee_index)?,
		ClientMessage::ContinueToSummer => game.continue_to_summer(session)?,
		ClientMessage::StartAwards => game.start_awards(session)?,
		ClientMessage::ContinueAfterBidding => game.continue_after_bidding(session)?,
		ClientMessage::ContinueFromAwards => game.continue_from_awards(session)?,
		ClientMessage::JoinGame { .. } | ClientMessage::RequestUpdate | ClientMessage::Heartbeat { .. } => {}
	}
	Ok(Reply::Broadcast)
}
