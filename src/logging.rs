use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Keeps the non-blocking file writer alive. Drop it last.
pub struct LogGuard {
	_guard: WorkerGuard,
}

/// Console plus a daily rolling file under `dir`. `RUST_LOG` wins over `level`.
pub fn init(dir: &Path, level: &str) -> Result<LogGuard, String> {
	std::fs::create_dir_all(dir)
		.map_err(|e| format!("Failed to create log dir {}: {}", dir.display(), e))?;

	let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "moguls.log");
	let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(level));

	let console_layer = fmt::layer()
		.with_writer(io::stdout)
		.with_target(true);

	let file_layer = fmt::layer()
		.with_writer(file_writer)
		.with_ansi(false)
		.with_target(true);

	tracing_subscriber::registry()
		.with(filter)
		.with(console_layer)
		.with(file_layer)
		.try_init()
		.map_err(|e| format!("Failed to install log subscriber: {}", e))?;

	tracing::info!(dir = %dir.display(), "logging initialised");
	Ok(LogGuard { _guard: guard })
}

pub mod session {
	use tracing::{info, warn};

	pub fn player_joined(name: &str, session: u64) {
		info!(target: "moguls::session", player = name, session, "joined");
	}

	pub fn player_rejoined(name: &str, old_session: u64, new_session: u64) {
		info!(target: "moguls::session", player = name, old_session, new_session, "reconnected");
	}

	pub fn player_disconnected(name: &str, session: u64) {
		info!(target: "moguls::session", player = name, session, "disconnected, data kept for reconnection");
	}

	pub fn player_timed_out(name: &str) {
		warn!(target: "moguls::session", player = name, "disconnect grace expired, no longer gating progress");
	}

	pub fn phase(from: &str, to: &str) {
		info!(target: "moguls::session", from, to, "phase change");
	}

	pub fn illegal_transition(from: &str, to: &str) {
		tracing::error!(target: "moguls::session", from, to, "illegal phase transition");
	}

	pub fn rejected(session: u64, action: &str, reason: &str) {
		info!(target: "moguls::session", session, action, reason, "action rejected");
	}

	pub fn ready(name: &str, checkpoint: &str, ready: usize, total: usize) {
		info!(target: "moguls::session", player = name, checkpoint, "ready ({}/{})", ready, total);
	}
}

pub mod naming {
	use tracing::info;

	pub fn talent_named(player: &str, role: &str, talent: &str) {
		info!(target: "moguls::naming", player, role, talent, "talent named");
	}

	pub fn player_complete(player: &str) {
		info!(target: "moguls::naming", player, "finished naming");
	}

	pub fn complete(pool_size: usize) {
		info!(target: "moguls::naming", pool_size, "naming complete, talent pool generated");
	}
}

pub mod draft {
	use tracing::{debug, info, warn};

	pub fn turn_dealt(year: u32, turn: u32, cards: &[String]) {
		info!(target: "moguls::draft", year, turn, "dealt {} cards: {}", cards.len(), cards.join(", "));
	}

	pub fn selected(player: &str, card: &str, salary: u32) {
		debug!(target: "moguls::draft", player, card, salary, "selected");
	}

	pub fn passed(player: &str) {
		debug!(target: "moguls::draft", player, "passed");
	}

	pub fn awarded(player: &str, card: &str, cost: u32, money_after: u32) {
		info!(target: "moguls::draft", player, card, cost, money_after, "card awarded");
	}

	pub fn award_skipped(player: &str, card: &str, reason: &str) {
		warn!(target: "moguls::draft", player, card, reason, "card not awarded");
	}

	pub fn contested(card: &str, players: &[String]) {
		info!(target: "moguls::draft", card, "bidding war between {}", players.join(", "));
	}

	pub fn season_over(season: &str) {
		info!(target: "moguls::draft", season, "production complete, packaging opens");
	}
}

pub mod bidding {
	use tracing::info;

	pub fn started(card: &str, participants: usize) {
		info!(target: "moguls::bidding", card, participants, "bidding war started");
	}

	pub fn bid(player: &str, amount: u32, total: u32) {
		info!(target: "moguls::bidding", player, amount, total, "bid placed");
	}

	pub fn won(player: &str, card: &str, amount: u32) {
		info!(target: "moguls::bidding", player, card, amount, "bidding war won");
	}

	pub fn tied(card: &str, amount: u32) {
		info!(target: "moguls::bidding", card, amount, "tie, nobody gets the role");
	}

	pub fn withdrawn(card: &str) {
		info!(target: "moguls::bidding", card, "no bids left standing, card stays unclaimed");
	}
}

pub mod packaging {
	use tracing::info;

	pub fn greenlit(player: &str, title: &str, heat: u32, prestige: u32) {
		info!(target: "moguls::packaging", player, title, heat, prestige, "film greenlit");
	}

	pub fn released_roles(player: &str, count: usize, refund: u32) {
		info!(target: "moguls::packaging", player, count, refund, "unused roles released");
	}
}

pub mod box_office {
	use tracing::info;

	pub fn film(studio: &str, title: &str, heat: u32, multiplier: f32, box_office: u32, label: &str) {
		info!(
			target: "moguls::box_office",
			studio, title, heat, multiplier = %format!("{:.1}", multiplier), box_office, label,
			"film released"
		);
	}
}

pub mod awards {
	use tracing::info;

	pub fn category_opened(category: &str, nominees: usize, electorate: usize) {
		info!(target: "moguls::awards", category, nominees, electorate, "voting opened");
	}

	pub fn category_skipped(category: &str) {
		info!(target: "moguls::awards", category, "no eligible films, skipped");
	}

	pub fn vote(player: &str, title: &str) {
		info!(target: "moguls::awards", player, title, "vote cast");
	}

	pub fn winner(category: &str, title: &str, studio: &str, points: u32) {
		info!(target: "moguls::awards", category, title, studio, points, "winner");
	}
}

pub mod net {
	use tracing::{debug, info, warn};

	pub fn listening(addr: &str) {
		info!(target: "moguls::net", addr, "server listening");
	}

	pub fn connected(conn: u64, peer: &str) {
		info!(target: "moguls::net", conn, peer, "client connected");
	}

	pub fn closed(conn: u64) {
		info!(target: "moguls::net", conn, "client disconnected");
	}

	pub fn malformed(conn: u64, reason: &str) {
		warn!(target: "moguls::net", conn, reason, "malformed frame");
	}

	pub fn frame(conn: u64, kind: &str) {
		debug!(target: "moguls::net", conn, kind, "frame received");
	}
}
