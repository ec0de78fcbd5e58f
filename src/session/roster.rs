use chrono::{DateTime, Utc};

use crate::error::{GameError, GameResult};
use crate::logging;
use crate::session::{GameSession, Phase, Player, PlayerId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
	Joined,
	/// A known name came back on a new connection and took its studio back.
	Rejoined,
	/// The connection already plays under this name.
	AlreadyBound,
}

impl GameSession {
	/// Binds a connection to a studio by name. New names only get in during the lobby.
	pub fn join(&mut self, session: SessionId, name: &str, now: DateTime<Utc>) -> GameResult<JoinOutcome> {
		let name = name.trim();
		if name.is_empty() {
			return Err(GameError::MissingName);
		}

		if let Some(&bound) = self.sessions.get(&session) {
			let current = self.player_name(bound);
			return if current == name {
				Ok(JoinOutcome::AlreadyBound)
			} else {
				Err(GameError::AlreadyJoined { name: current })
			};
		}

		if let Some(player) = self.players.values_mut().find(|p| p.name == name) {
			let old = player.session;
			let id = player.id;
			player.mark_connected(session, now);
			logging::session::player_rejoined(name, old.0, session.0);
			self.sessions.remove(&old);
			self.sessions.insert(session, id);
			return Ok(JoinOutcome::Rejoined);
		}

		self.require("join_game", self.phase == Phase::Lobby)?;
		let id = PlayerId(self.next_player);
		self.next_player += 1;
		self.players.insert(
			id,
			Player::new(id, name.to_string(), session, self.rules.starting_money, now),
		);
		self.sessions.insert(session, id);
		logging::session::player_joined(name, session.0);
		Ok(JoinOutcome::Joined)
	}

	/// Refreshes liveness only.
	pub fn heartbeat(&mut self, session: SessionId, now: DateTime<Utc>) {
		if let Some(id) = self.sessions.get(&session) {
			if let Some(player) = self.players.get_mut(id) {
				player.last_seen = now;
			}
		}
	}

	/// The studio keeps its data; the connection is forgotten.
	pub fn disconnect(&mut self, session: SessionId, now: DateTime<Utc>) -> bool {
		let Some(id) = self.sessions.remove(&session) else {
			return false;
		};
		if let Some(player) = self.players.get_mut(&id) {
			player.mark_disconnected(now);
			logging::session::player_disconnected(&player.name, session.0);
		}
		true
	}

	/// Times out players disconnected for longer than the grace period.
	/// Returns true when anyone timed out.
	pub fn expire_idle(&mut self, now: DateTime<Utc>) -> bool {
		let Some(grace) = self.rules.disconnect_grace() else {
			return false;
		};

		let mut expired = false;
		for player in self.players.values_mut() {
			if player.connected || player.timed_out {
				continue;
			}
			if player.disconnected_at.is_some_and(|at| now - at >= grace) {
				player.timed_out = true;
				logging::session::player_timed_out(&player.name);
				expired = true;
			}
		}

		if expired {
			self.settle();
		}
		expired
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::testing::*;
	use crate::session::{Season, Selection};
	use chrono::Duration;

	#[test]
	fn test_join_and_repeat_join_on_same_connection() {
		let mut session = session_with(rules(1), &[]);
		let now = Utc::now();
		assert_eq!(session.join(sid(1), "Ava", now).unwrap(), JoinOutcome::Joined);
		assert_eq!(session.join(sid(1), "Ava", now).unwrap(), JoinOutcome::AlreadyBound);
		assert_eq!(
			session.join(sid(1), "Ben", now).unwrap_err(),
			GameError::AlreadyJoined { name: "Ava".to_string() }
		);
		assert_eq!(session.join(sid(2), "  ", now).unwrap_err(), GameError::MissingName);
		assert_eq!(session.players().count(), 1);
	}

	#[test]
	fn test_rejoin_rebinds_without_duplicating() {
		let mut session = drafting(&["Ava", "Ben"], 4);
		session.select_card(sid(1), Selection::Pass).unwrap();
		let before = session.player_for(sid(1)).unwrap().clone();

		let now = Utc::now();
		session.disconnect(sid(1), now);
		assert!(session.player_for(sid(1)).is_none());
		assert_eq!(session.join(sid(7), "Ava", now).unwrap(), JoinOutcome::Rejoined);

		let after = session.player_for(sid(7)).unwrap();
		assert_eq!(after.id, before.id);
		assert_eq!(after.money, before.money);
		assert_eq!(after.session, sid(7));
		assert!(after.connected);
		assert_eq!(session.players().count(), 2);

		// The pass made before the reconnect still stands.
		assert_eq!(session.select_card(sid(7), Selection::Pass).unwrap_err(), GameError::DuplicateSelection);
	}

	#[test]
	fn test_new_names_rejected_after_lobby() {
		let mut session = drafting(&["Ava", "Ben"], 4);
		let err = session.join(sid(9), "Zed", Utc::now()).unwrap_err();
		assert!(matches!(err, GameError::InvalidPhaseAction { action: "join_game", .. }));
	}

	#[test]
	fn test_grace_period_then_auto_pass() {
		let mut r = rules(4);
		r.disconnect_grace_secs = Some(30);
		let mut session = session_with(r, &["Ava", "Ben"]);
		session.start_naming().unwrap();
		for n in 1..=2 {
			for _ in 0..11 {
				session.submit_talent_name(sid(n), "").unwrap();
			}
		}
		session.start_production().unwrap();

		let now = Utc::now();
		session.select_card(sid(1), Selection::Pass).unwrap();
		session.disconnect(sid(2), now);

		assert!(!session.expire_idle(now + Duration::seconds(29)));
		assert_eq!(session.turn(), 1);

		assert!(session.expire_idle(now + Duration::seconds(30)));
		assert!(session.player_by_name("Ben").unwrap().timed_out);
		assert_eq!(session.turn(), 2);
		assert_eq!(session.phase(), Phase::Production(Season::Winter));

		// Coming back clears the timeout for the next step.
		session.join(sid(3), "Ben", now).unwrap();
		assert!(!session.player_by_name("Ben").unwrap().timed_out);
		session.select_card(sid(1), Selection::Pass).unwrap();
		assert_eq!(session.turn(), 2);
	}

	#[test]
	fn test_no_grace_keeps_slot_forever() {
		let mut r = rules(4);
		r.disconnect_grace_secs = None;
		let mut session = session_with(r, &["Ava", "Ben"]);
		let now = Utc::now();
		session.disconnect(sid(2), now);
		assert!(!session.expire_idle(now + Duration::days(3)));
		assert!(!session.player_by_name("Ben").unwrap().timed_out);
	}

	#[test]
	fn test_heartbeat_refreshes_last_seen() {
		let mut session = session_with(rules(1), &["Ava"]);
		let later = Utc::now() + Duration::seconds(5);
		session.heartbeat(sid(1), later);
		assert_eq!(session.player_for(sid(1)).unwrap().last_seen, later);
		session.heartbeat(sid(42), later);
	}
}
