use std::collections::{BTreeMap, VecDeque};

use crate::error::{GameError, GameResult};
use crate::logging;
use crate::session::{Checkpoint, GameSession, Phase, PlayerId, SessionId};
use crate::talent::Talent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
	Won { player: PlayerId, amount: u32 },
	/// Two or more players topped out at the same amount. Nobody gets the card.
	Tied { amount: u32 },
	/// Every participant dropped out before bidding.
	Withdrawn,
}

#[derive(Debug, Clone)]
pub(crate) struct QueuedWar {
	pub card_index: usize,
	pub participants: Vec<PlayerId>,
}

/// Sealed-bid auction for one contested card.
#[derive(Debug, Clone)]
pub struct BiddingWar {
	pub card_index: usize,
	pub card: Talent,
	pub participants: Vec<PlayerId>,
	pub bids: BTreeMap<PlayerId, u32>,
	pub outcome: Option<BidOutcome>,
}

impl BiddingWar {
	pub fn new(card_index: usize, card: Talent, participants: Vec<PlayerId>) -> Self {
		Self {
			card_index,
			card,
			participants,
			bids: BTreeMap::new(),
			outcome: None,
		}
	}

	/// Unique highest bid wins; a tie at the top leaves the card unclaimed.
	pub fn resolve(&self) -> BidOutcome {
		let Some(&top) = self.bids.values().max() else {
			return BidOutcome::Withdrawn;
		};
		let mut leaders = self.bids.iter().filter(|&(_, &bid)| bid == top);
		match (leaders.next(), leaders.next()) {
			(Some((&player, _)), None) => BidOutcome::Won { player, amount: top },
			_ => BidOutcome::Tied { amount: top },
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct BiddingState {
	pub active: Option<BiddingWar>,
	pub(crate) queue: VecDeque<QueuedWar>,
}

impl BiddingState {
	pub fn queued_cards(&self) -> Vec<usize> {
		self.queue.iter().map(|q| q.card_index).collect()
	}
}

impl GameSession {
	/// Opens the next queued war, or finishes the turn when none is left.
	pub(super) fn start_next_war(&mut self) {
		let Some(season) = self.phase.season() else {
			return;
		};

		while let Some(next) = self.bidding.queue.pop_front() {
			let Some(card) = self.draft.cards.get(next.card_index).cloned() else {
				continue;
			};
			logging::bidding::started(&card.name, next.participants.len());
			self.bidding.active = Some(BiddingWar::new(next.card_index, card, next.participants));
			self.enter(Phase::Bidding(season));
			return;
		}

		self.bidding.active = None;
		self.finish_turn();
	}

	pub fn submit_bid(&mut self, session: SessionId, amount: i64) -> GameResult<()> {
		self.require("submit_bid", matches!(self.phase, Phase::Bidding(_)))?;
		let id = self.player_id(session)?;
		let player = self.player(id)?;
		let Some(war) = self.bidding.active.as_ref() else {
			return Err(GameError::InvalidBid {
				reason: "No active bidding war!".to_string(),
			});
		};

		if !war.participants.contains(&id) {
			return Err(GameError::NotParticipant);
		}
		if war.bids.contains_key(&id) {
			return Err(GameError::InvalidBid {
				reason: "You have already submitted your bid!".to_string(),
			});
		}
		if amount < 0 {
			return Err(GameError::InvalidBid {
				reason: "Bid cannot be negative!".to_string(),
			});
		}
		let amount = u32::try_from(amount).map_err(|_| GameError::InvalidBid {
			reason: "Bid is too large!".to_string(),
		})?;

		let total = war.card.salary.saturating_add(amount);
		if !player.can_afford(total) {
			return Err(GameError::InvalidBid {
				reason: format!("Cannot afford! Total cost: ${}M, Your budget: ${}M", total, player.money),
			});
		}

		logging::bidding::bid(&player.name, amount, total);
		if let Some(war) = self.bidding.active.as_mut() {
			war.bids.insert(id, amount);
		}
		self.settle();
		Ok(())
	}

	pub(super) fn try_resolve_war(&mut self) -> bool {
		let Some(war) = self.bidding.active.as_ref() else {
			return false;
		};
		if war.outcome.is_some() {
			return false;
		}
		if !self.all_active_done(war.participants.iter().copied(), |id| war.bids.contains_key(&id)) {
			return false;
		}

		let mut outcome = war.resolve();
		let card_index = war.card_index;
		let card_name = war.card.name.clone();

		match outcome {
			BidOutcome::Won { player, amount } => {
				if self.award_card(player, card_index, amount) {
					logging::bidding::won(&self.player_name(player), &card_name, amount);
				} else {
					outcome = BidOutcome::Withdrawn;
				}
			}
			BidOutcome::Tied { amount } => logging::bidding::tied(&card_name, amount),
			BidOutcome::Withdrawn => logging::bidding::withdrawn(&card_name),
		}

		if let Some(war) = self.bidding.active.as_mut() {
			war.outcome = Some(outcome);
		}
		if let Some(season) = self.phase.season() {
			self.enter(Phase::BiddingResults(season));
		}
		true
	}

	pub fn continue_after_bidding(&mut self, session: SessionId) -> GameResult<()> {
		let allowed = matches!(self.phase, Phase::BiddingResults(_));
		self.acknowledge(session, "continue_after_bidding", Checkpoint::BiddingResultsSeen, allowed)
	}

	pub(super) fn try_leave_bidding_results(&mut self) -> bool {
		if !self.all_ready(Checkpoint::BiddingResultsSeen) {
			return false;
		}
		self.readiness.clear(Checkpoint::BiddingResultsSeen);
		self.bidding.active = None;
		self.start_next_war();
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::testing::*;
	use crate::session::{Season, Selection};
	use crate::talent::{Role, TalentId};
	use chrono::Utc;

	fn war(bids: &[(u32, u32)]) -> BiddingWar {
		let card = Talent::new(TalentId(1), "Dusty Hoffman", Role::Star, 200, 40, 20);
		let mut w = BiddingWar::new(0, card, bids.iter().map(|(p, _)| PlayerId(*p)).collect());
		for (p, b) in bids {
			w.bids.insert(PlayerId(*p), *b);
		}
		w
	}

	#[test]
	fn test_unique_max_wins() {
		assert_eq!(
			war(&[(1, 5), (2, 12), (3, 7)]).resolve(),
			BidOutcome::Won { player: PlayerId(2), amount: 12 }
		);
	}

	#[test]
	fn test_tie_at_max_nobody_wins() {
		assert_eq!(war(&[(1, 10), (2, 10), (3, 2)]).resolve(), BidOutcome::Tied { amount: 10 });
		assert_eq!(war(&[(1, 0), (2, 0)]).resolve(), BidOutcome::Tied { amount: 0 });
	}

	#[test]
	fn test_no_bids_is_withdrawn() {
		assert_eq!(war(&[]).resolve(), BidOutcome::Withdrawn);
	}

	/// Ava and Ben both pick card 1 (salary 20); Cy takes card 0 (salary 10).
	fn contested() -> GameSession {
		let mut session = drafting(&["Ava", "Ben", "Cy"], 9);
		set_cards(&mut session, &[10, 20, 5, 5]);
		session.select_card(sid(1), Selection::Card(1)).unwrap();
		session.select_card(sid(2), Selection::Card(1)).unwrap();
		session.select_card(sid(3), Selection::Card(0)).unwrap();
		session
	}

	#[test]
	fn test_bid_validation() {
		let mut session = contested();
		set_money(&mut session, 1, 30);

		assert_eq!(session.submit_bid(sid(3), 5).unwrap_err(), GameError::NotParticipant);
		assert!(matches!(
			session.submit_bid(sid(1), -1).unwrap_err(),
			GameError::InvalidBid { .. }
		));
		let err = session.submit_bid(sid(1), 11).unwrap_err();
		assert_eq!(
			err,
			GameError::InvalidBid {
				reason: "Cannot afford! Total cost: $31M, Your budget: $30M".to_string(),
			}
		);
		session.submit_bid(sid(1), 10).unwrap();
		assert!(matches!(
			session.submit_bid(sid(1), 1).unwrap_err(),
			GameError::InvalidBid { .. }
		));
		assert_eq!(session.phase(), Phase::Bidding(Season::Winter));
	}

	#[test]
	fn test_winner_pays_salary_plus_bid_loser_pays_nothing() {
		let mut session = contested();
		session.submit_bid(sid(1), 12).unwrap();
		session.submit_bid(sid(2), 5).unwrap();

		assert_eq!(session.phase(), Phase::BiddingResults(Season::Winter));
		assert_eq!(session.player_for(sid(1)).unwrap().money, 100 - 32);
		assert_eq!(session.player_for(sid(1)).unwrap().roles.len(), 1);
		assert_eq!(session.player_for(sid(2)).unwrap().money, 100);
		assert!(session.player_for(sid(2)).unwrap().roles.is_empty());
		assert_eq!(
			session.bidding_war().unwrap().outcome,
			Some(BidOutcome::Won { player: id_of(&session, 1), amount: 12 })
		);
	}

	#[test]
	fn test_tie_leaves_card_and_money() {
		let mut session = contested();
		session.submit_bid(sid(1), 8).unwrap();
		session.submit_bid(sid(2), 8).unwrap();

		assert_eq!(session.bidding_war().unwrap().outcome, Some(BidOutcome::Tied { amount: 8 }));
		for n in 1..=2 {
			let p = session.player_for(sid(n)).unwrap();
			assert_eq!(p.money, 100);
			assert!(p.roles.is_empty());
		}
	}

	#[test]
	fn test_results_need_everyone_then_turn_completes() {
		let mut session = contested();
		session.submit_bid(sid(1), 3).unwrap();
		session.submit_bid(sid(2), 1).unwrap();

		session.continue_after_bidding(sid(1)).unwrap();
		session.continue_after_bidding(sid(1)).unwrap();
		session.continue_after_bidding(sid(2)).unwrap();
		assert_eq!(session.phase(), Phase::BiddingResults(Season::Winter));

		session.continue_after_bidding(sid(3)).unwrap();
		assert_eq!(session.phase(), Phase::Production(Season::Winter));
		assert_eq!(session.turn(), 2);
		// Cy's uncontested card was handed over once the war finished.
		let cy = session.player_for(sid(3)).unwrap();
		assert_eq!(cy.money, 90);
		assert_eq!(cy.roles.len(), 1);
	}

	#[test]
	fn test_queued_wars_run_in_card_order() {
		let mut session = drafting(&["Ava", "Ben", "Cy", "Dee"], 9);
		set_cards(&mut session, &[10, 20, 5, 5, 5]);
		session.select_card(sid(1), Selection::Card(3)).unwrap();
		session.select_card(sid(2), Selection::Card(3)).unwrap();
		session.select_card(sid(3), Selection::Card(1)).unwrap();
		session.select_card(sid(4), Selection::Card(1)).unwrap();

		assert_eq!(session.bidding_war().unwrap().card_index, 1);
		session.submit_bid(sid(3), 1).unwrap();
		session.submit_bid(sid(4), 2).unwrap();
		for n in 1..=4 {
			session.continue_after_bidding(sid(n)).unwrap();
		}

		assert_eq!(session.phase(), Phase::Bidding(Season::Winter));
		assert_eq!(session.bidding_war().unwrap().card_index, 3);
		assert_eq!(session.turn(), 1);
	}

	#[test]
	fn test_timed_out_participant_is_withdrawn() {
		let mut r = rules(9);
		r.disconnect_grace_secs = Some(5);
		let mut session = session_with(r, &["Ava", "Ben", "Cy"]);
		session.start_naming().unwrap();
		for n in 1..=3 {
			for _ in 0..11 {
				session.submit_talent_name(sid(n), "").unwrap();
			}
		}
		session.start_production().unwrap();
		set_cards(&mut session, &[10, 20, 5, 5]);
		session.select_card(sid(1), Selection::Card(1)).unwrap();
		session.select_card(sid(2), Selection::Card(1)).unwrap();
		session.select_card(sid(3), Selection::Pass).unwrap();

		let now = Utc::now();
		session.submit_bid(sid(1), 4).unwrap();
		session.disconnect(sid(2), now);
		session.expire_idle(now + chrono::Duration::seconds(6));

		assert_eq!(session.phase(), Phase::BiddingResults(Season::Winter));
		assert_eq!(
			session.bidding_war().unwrap().outcome,
			Some(BidOutcome::Won { player: id_of(&session, 1), amount: 4 })
		);
	}
}
