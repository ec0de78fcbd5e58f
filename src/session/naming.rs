use serde::{Deserialize, Serialize};

use crate::config::NamingQuota;
use crate::error::{GameError, GameResult};
use crate::logging;
use crate::session::{GameSession, Phase, PlayerId, SessionId};
use crate::talent::{Role, disambiguate_names, generate_talent};

/// Names a player has handed in so far, by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingProgress {
	pub screenwriter: Vec<String>,
	pub director: Vec<String>,
	pub star: Vec<String>,
	pub complete: bool,
}

impl NamingProgress {
	pub fn names(&self, role: Role) -> &[String] {
		match role {
			Role::Screenwriter => &self.screenwriter,
			Role::Director => &self.director,
			Role::Star => &self.star,
			Role::Producer => &[],
		}
	}

	/// Screenwriters fill first, then directors, then stars.
	pub fn next_role(&self, quota: &NamingQuota) -> Option<Role> {
		[
			(Role::Screenwriter, quota.screenwriter),
			(Role::Director, quota.director),
			(Role::Star, quota.star),
		]
		.into_iter()
		.find(|(role, wanted)| self.names(*role).len() < *wanted)
		.map(|(role, _)| role)
	}

	fn push(&mut self, role: Role, name: String) {
		match role {
			Role::Screenwriter => self.screenwriter.push(name),
			Role::Director => self.director.push(name),
			Role::Star => self.star.push(name),
			Role::Producer => {}
		}
	}
}

impl GameSession {
	/// Host action: opens naming for everyone in the lobby.
	pub fn start_naming(&mut self) -> GameResult<()> {
		self.require("start_phase0", self.phase == Phase::Lobby)?;
		let joined = self.players.len();
		if joined < self.rules.min_players {
			return Err(GameError::NotEnoughPlayers {
				required: self.rules.min_players,
				joined,
			});
		}

		let nothing_to_name = self.rules.naming.total() == 0;
		self.naming = self
			.players
			.keys()
			.map(|id| {
				let progress = NamingProgress {
					complete: nothing_to_name,
					..NamingProgress::default()
				};
				(*id, progress)
			})
			.collect();
		self.enter(Phase::Naming);
		self.settle();
		Ok(())
	}

	pub fn submit_talent_name(&mut self, session: SessionId, name: &str) -> GameResult<()> {
		self.require("submit_talent_name", self.phase == Phase::Naming)?;
		let id = self.player_id(session)?;
		self.name_next_talent(id, name)?;
		self.settle();
		Ok(())
	}

	fn name_next_talent(&mut self, id: PlayerId, name: &str) -> GameResult<Role> {
		let quota = self.rules.naming;
		let (role, index) = {
			let progress = self.naming.entry(id).or_default();
			if progress.complete {
				return Err(GameError::NamingComplete);
			}
			let role = progress.next_role(&quota).ok_or(GameError::NamingComplete)?;
			(role, progress.names(role).len())
		};

		let name = match name.trim() {
			"" => self
				.content
				.default_name(role, index)
				.map(str::to_string)
				.unwrap_or_else(|| format!("{} {}", role.label(), index + 1)),
			given => given.to_string(),
		};

		let talent = generate_talent(self.ids.next_id(), role, &name, &self.content, &mut self.rng);
		self.talent_pool.push(talent);

		let player = self.player_name(id);
		logging::naming::talent_named(&player, role.key(), &name);

		if let Some(progress) = self.naming.get_mut(&id) {
			progress.push(role, name);
			if progress.next_role(&quota).is_none() {
				progress.complete = true;
				logging::naming::player_complete(&player);
			}
		}
		Ok(role)
	}

	fn naming_complete(&self, id: PlayerId) -> bool {
		self.naming.get(&id).is_some_and(|p| p.complete)
	}

	pub(super) fn try_finish_naming(&mut self) -> bool {
		let ids: Vec<PlayerId> = self.players.keys().copied().collect();
		if !self.all_active_done(ids.iter().copied(), |id| self.naming_complete(id)) {
			return false;
		}

		// Timed-out players get the default names for whatever they left open.
		for id in ids {
			while !self.naming_complete(id) {
				if self.name_next_talent(id, "").is_err() {
					break;
				}
			}
		}

		disambiguate_names(&mut self.talent_pool);
		self.enter(Phase::NamingComplete);
		logging::naming::complete(self.talent_pool.len());
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::testing::*;
	use chrono::Utc;

	#[test]
	fn test_start_needs_enough_players() {
		let mut session = session_with(rules(1), &["Ava"]);
		let err = session.start_naming().unwrap_err();
		assert_eq!(err, GameError::NotEnoughPlayers { required: 2, joined: 1 });
		assert_eq!(session.phase(), Phase::Lobby);
	}

	#[test]
	fn test_names_fill_roles_in_order() {
		let mut session = session_with(rules(1), &["Ava", "Ben"]);
		session.start_naming().unwrap();

		let roles: Vec<Role> = (0..11)
			.map(|i| {
				let id = id_of(&session, 1);
				session.name_next_talent(id, &format!("N{}", i)).unwrap()
			})
			.collect();
		assert_eq!(&roles[0..3], &[Role::Screenwriter; 3]);
		assert_eq!(&roles[3..6], &[Role::Director; 3]);
		assert_eq!(&roles[6..11], &[Role::Star; 5]);

		let err = session.submit_talent_name(sid(1), "Twelfth").unwrap_err();
		assert_eq!(err, GameError::NamingComplete);
		assert_eq!(session.talent_pool().len(), 11);
		assert_eq!(session.phase(), Phase::Naming);
	}

	#[test]
	fn test_blank_name_uses_default() {
		let mut session = session_with(rules(1), &["Ava", "Ben"]);
		session.start_naming().unwrap();
		session.submit_talent_name(sid(1), "   ").unwrap();
		assert_eq!(session.talent_pool()[0].name, "Bobby Goldman");
		assert_eq!(session.talent_pool()[0].role, Role::Screenwriter);
	}

	#[test]
	fn test_naming_completes_and_disambiguates() {
		let mut session = session_with(rules(1), &["Ava", "Ben"]);
		session.start_naming().unwrap();
		for n in 1..=2 {
			for _ in 0..11 {
				session.submit_talent_name(sid(n), "Same Name").unwrap();
			}
		}

		assert_eq!(session.phase(), Phase::NamingComplete);
		let names: Vec<&str> = session.talent_pool().iter().map(|t| t.name.as_str()).collect();
		assert_eq!(names[0], "Same Name");
		assert_eq!(names[1], "Same Name Jr.");
		assert_eq!(names[2], "Same Name II");
		assert_eq!(names[6], "Same Name #7");
		let mut unique = names.clone();
		unique.sort();
		unique.dedup();
		assert_eq!(unique.len(), 22);
	}

	#[test]
	fn test_timed_out_player_gets_defaults() {
		let mut r = rules(1);
		r.disconnect_grace_secs = Some(10);
		let mut session = session_with(r, &["Ava", "Ben"]);
		session.start_naming().unwrap();

		let now = Utc::now();
		session.disconnect(sid(2), now);
		for _ in 0..11 {
			session.submit_talent_name(sid(1), "").unwrap();
		}
		assert_eq!(session.phase(), Phase::Naming);

		assert!(session.expire_idle(now + chrono::Duration::seconds(11)));
		assert_eq!(session.phase(), Phase::NamingComplete);
		assert_eq!(session.talent_pool().len(), 22);
	}

	#[test]
	fn test_production_requires_naming_complete() {
		let mut session = session_with(rules(1), &["Ava", "Ben"]);
		session.start_naming().unwrap();
		let err = session.start_production().unwrap_err();
		assert!(matches!(err, GameError::InvalidPhaseAction { action: "start_phase1", .. }));
	}
}
