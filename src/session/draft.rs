use rand::seq::{IndexedRandom, SliceRandom};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{GameError, GameResult};
use crate::logging;
use crate::session::bidding::QueuedWar;
use crate::session::{BiddingState, Checkpoint, GameSession, Phase, PlayerId, Season, SessionId};
use crate::talent::{Talent, random_producer};

/// A player's pick for the turn: a card index, or `"pass"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
	Card(usize),
	Pass,
}

impl Serialize for Selection {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Selection::Card(index) => serializer.serialize_u64(*index as u64),
			Selection::Pass => serializer.serialize_str("pass"),
		}
	}
}

impl<'de> Deserialize<'de> for Selection {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct SelectionVisitor;

		impl Visitor<'_> for SelectionVisitor {
			type Value = Selection;

			fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
				f.write_str("a card index or \"pass\"")
			}

			fn visit_u64<E: de::Error>(self, v: u64) -> Result<Selection, E> {
				Ok(Selection::Card(v as usize))
			}

			fn visit_i64<E: de::Error>(self, v: i64) -> Result<Selection, E> {
				usize::try_from(v)
					.map(Selection::Card)
					.map_err(|_| E::custom(format!("invalid card index {}", v)))
			}

			fn visit_str<E: de::Error>(self, v: &str) -> Result<Selection, E> {
				if v.eq_ignore_ascii_case("pass") {
					Ok(Selection::Pass)
				} else {
					Err(E::invalid_value(de::Unexpected::Str(v), &self))
				}
			}
		}

		deserializer.deserialize_any(SelectionVisitor)
	}
}

/// The offer on the table for the current turn.
#[derive(Debug, Clone, Default)]
pub struct Draft {
	pub cards: Vec<Talent>,
	pub selections: BTreeMap<PlayerId, Selection>,
	/// Single-claimant cards, handed over once the turn's bidding wars are done.
	pub pending_awards: Vec<(usize, PlayerId)>,
}

impl GameSession {
	/// Host action: first turn of the winter season.
	pub fn start_production(&mut self) -> GameResult<()> {
		self.require("start_phase1", self.phase == Phase::NamingComplete)?;
		self.year = 1;
		self.turn = 1;
		self.enter(Phase::Production(Season::Winter));
		self.deal_turn();
		self.settle();
		Ok(())
	}

	/// One card per active player from the pool, plus a fresh producer.
	fn deal_turn(&mut self) {
		let count = self.active_count().max(1);
		let mut cards: Vec<Talent> = self
			.talent_pool
			.choose_multiple(&mut self.rng, count)
			.cloned()
			.collect();
		cards.push(random_producer(self.ids.next_id(), &self.content, &mut self.rng));
		cards.shuffle(&mut self.rng);

		let names: Vec<String> = cards.iter().map(|c| format!("{} ({})", c.name, c.role.key())).collect();
		logging::draft::turn_dealt(self.year, self.turn, &names);

		self.draft = Draft {
			cards,
			..Draft::default()
		};
		self.bidding = BiddingState::default();
	}

	pub fn select_card(&mut self, session: SessionId, selection: Selection) -> GameResult<()> {
		self.require("select_card", matches!(self.phase, Phase::Production(_)))?;
		let id = self.player_id(session)?;
		if self.draft.selections.contains_key(&id) {
			return Err(GameError::DuplicateSelection);
		}

		let player = self.player(id)?;
		match selection {
			Selection::Card(index) => {
				let card = self.draft.cards.get(index).ok_or(GameError::InvalidCard { index })?;
				if !player.can_afford(card.salary) {
					return Err(GameError::InsufficientFunds {
						name: card.name.clone(),
						required: card.salary,
						available: player.money,
					});
				}
				logging::draft::selected(&player.name, &card.name, card.salary);
			}
			Selection::Pass => logging::draft::passed(&player.name),
		}

		self.draft.selections.insert(id, selection);
		self.settle();
		Ok(())
	}

	pub(super) fn try_resolve_selections(&mut self) -> bool {
		let ids: Vec<PlayerId> = self.players.keys().copied().collect();
		if !self.all_active_done(ids, |id| self.draft.selections.contains_key(&id)) {
			return false;
		}

		// Missing selections (timed-out players) count as passes.
		let mut claims: BTreeMap<usize, Vec<PlayerId>> = BTreeMap::new();
		for (id, selection) in &self.draft.selections {
			if let Selection::Card(index) = selection {
				claims.entry(*index).or_default().push(*id);
			}
		}

		for (card_index, claimants) in claims {
			if claimants.len() == 1 {
				self.draft.pending_awards.push((card_index, claimants[0]));
				continue;
			}

			let names: Vec<String> = claimants.iter().map(|id| self.player_name(*id)).collect();
			if let Some(card) = self.draft.cards.get(card_index) {
				logging::draft::contested(&card.name, &names);
			}
			self.bidding.queue.push_back(QueuedWar {
				card_index,
				participants: claimants,
			});
		}

		self.start_next_war();
		true
	}

	/// Hands over the turn's uncontested cards and moves on.
	pub(super) fn finish_turn(&mut self) {
		let awards = std::mem::take(&mut self.draft.pending_awards);
		for (card_index, id) in awards {
			self.award_card(id, card_index, 0);
		}
		self.advance_turn();
	}

	/// Charges salary plus `extra` and moves the card into the player's roles.
	pub(super) fn award_card(&mut self, id: PlayerId, card_index: usize, extra: u32) -> bool {
		let Some(card) = self.draft.cards.get(card_index).cloned() else {
			return false;
		};
		let Some(player) = self.players.get_mut(&id) else {
			return false;
		};

		let cost = card.salary.saturating_add(extra);
		match player.debit(&card.name, cost) {
			Ok(money_after) => {
				logging::draft::awarded(&player.name, &card.name, cost, money_after);
				self.talent_pool.retain(|t| t.id != card.id);
				player.roles.push(card);
				true
			}
			Err(e) => {
				logging::draft::award_skipped(&player.name, &card.name, &e.to_string());
				false
			}
		}
	}

	fn advance_turn(&mut self) {
		let Some(season) = self.phase.season() else {
			return;
		};

		self.turn += 1;
		if self.turn <= self.rules.turns_per_season {
			self.enter(Phase::Production(season));
			self.deal_turn();
		} else {
			self.draft = Draft::default();
			self.enter(Phase::Packaging(season));
			logging::draft::season_over(&season.to_string());
		}
	}

	pub fn continue_to_summer(&mut self, session: SessionId) -> GameResult<()> {
		let allowed = self.phase == Phase::Releases(Season::Winter);
		self.acknowledge(session, "continue_to_summer", Checkpoint::ReleasesSeen(Season::Winter), allowed)
	}

	pub(super) fn try_start_summer(&mut self) -> bool {
		if !self.all_ready(Checkpoint::ReleasesSeen(Season::Winter)) {
			return false;
		}
		self.readiness.clear_season(Season::Winter);
		self.turn = 1;
		self.enter(Phase::Production(Season::Summer));
		self.deal_turn();
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::testing::*;
	use crate::talent::Role;

	#[test]
	fn test_selection_wire_format() {
		assert_eq!(serde_json::to_string(&Selection::Card(2)).unwrap(), "2");
		assert_eq!(serde_json::to_string(&Selection::Pass).unwrap(), "\"pass\"");
		assert_eq!(serde_json::from_str::<Selection>("3").unwrap(), Selection::Card(3));
		assert_eq!(serde_json::from_str::<Selection>("\"pass\"").unwrap(), Selection::Pass);
		assert!(serde_json::from_str::<Selection>("-1").is_err());
		assert!(serde_json::from_str::<Selection>("\"fold\"").is_err());
	}

	#[test]
	fn test_offer_size_is_players_plus_one() {
		let session = drafting(&["Ava", "Ben", "Cy"], 7);
		assert_eq!(session.phase(), Phase::Production(Season::Winter));
		assert_eq!(session.turn(), 1);
		let cards = session.current_cards();
		assert_eq!(cards.len(), 4);
		assert_eq!(cards.iter().filter(|c| c.role == Role::Producer).count(), 1);
	}

	#[test]
	fn test_single_claimant_is_charged_and_card_leaves_pool() {
		let mut session = drafting(&["Ava", "Ben"], 7);
		let card = session.current_cards().iter().find(|c| c.role != Role::Producer).cloned().unwrap();
		let index = session.current_cards().iter().position(|c| c.id == card.id).unwrap();
		set_money(&mut session, 1, 100);

		session.select_card(sid(1), Selection::Card(index)).unwrap();
		session.select_card(sid(2), Selection::Pass).unwrap();

		let ava = session.player_for(sid(1)).unwrap();
		assert_eq!(ava.money, 100 - card.salary);
		assert_eq!(ava.roles.len(), 1);
		assert_eq!(ava.roles[0].id, card.id);
		assert!(session.talent_pool().iter().all(|t| t.id != card.id));
		assert_eq!(session.turn(), 2);
	}

	#[test]
	fn test_duplicate_selection_rejected() {
		let mut session = drafting(&["Ava", "Ben", "Cy"], 7);
		session.select_card(sid(1), Selection::Pass).unwrap();
		let err = session.select_card(sid(1), Selection::Card(0)).unwrap_err();
		assert_eq!(err, GameError::DuplicateSelection);
	}

	#[test]
	fn test_invalid_card_and_unaffordable_card() {
		let mut session = drafting(&["Ava", "Ben"], 7);
		set_cards(&mut session, &[10, 60, 5]);
		set_money(&mut session, 1, 50);

		assert_eq!(
			session.select_card(sid(1), Selection::Card(9)).unwrap_err(),
			GameError::InvalidCard { index: 9 }
		);
		assert_eq!(
			session.select_card(sid(1), Selection::Card(1)).unwrap_err(),
			GameError::InsufficientFunds {
				name: "Card 1".to_string(),
				required: 60,
				available: 50,
			}
		);
		assert!(session.select_card(sid(1), Selection::Card(0)).is_ok());
	}

	#[test]
	fn test_contention_opens_bidding_war() {
		let mut session = drafting(&["Ava", "Ben", "Cy"], 7);
		set_cards(&mut session, &[10, 20, 5, 5]);

		session.select_card(sid(1), Selection::Card(1)).unwrap();
		session.select_card(sid(2), Selection::Card(1)).unwrap();
		session.select_card(sid(3), Selection::Card(0)).unwrap();

		assert_eq!(session.phase(), Phase::Bidding(Season::Winter));
		assert_eq!(session.turn(), 1);
		let war = session.bidding_war().unwrap();
		assert_eq!(war.card_index, 1);
		assert_eq!(war.participants, vec![id_of(&session, 1), id_of(&session, 2)]);

		// The uncontested card waits for the war.
		assert!(session.player_for(sid(3)).unwrap().roles.is_empty());
	}

	#[test]
	fn test_season_ends_after_turn_limit() {
		let mut session = drafting(&["Ava", "Ben"], 7);
		for _ in 0..5 {
			session.select_card(sid(1), Selection::Pass).unwrap();
			session.select_card(sid(2), Selection::Pass).unwrap();
		}
		assert_eq!(session.phase(), Phase::Packaging(Season::Winter));
		assert!(session.current_cards().is_empty());
	}

	#[test]
	fn test_selection_outside_production_rejected() {
		let mut session = drafting(&["Ava", "Ben"], 7);
		force_phase(&mut session, Phase::Packaging(Season::Winter));
		let err = session.select_card(sid(1), Selection::Pass).unwrap_err();
		assert!(matches!(err, GameError::InvalidPhaseAction { action: "select_card", .. }));
	}
}
