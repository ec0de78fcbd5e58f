use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::session::packaging::missing_roles;
use crate::session::{
	AwardCategory, BidOutcome, Checkpoint, Film, GameSession, NamingProgress, Phase, Player,
	PlayerId, Season, Selection, SessionId,
};
use crate::talent::{NoNameRoster, Role, Talent};

/// Everything a client needs to draw the game. Broadcast after every accepted action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
	pub phase: Phase,
	pub players: BTreeMap<SessionId, PlayerView>,
	pub year: u32,
	pub turn: u32,
	pub current_turn_cards: Vec<Talent>,
	pub player_selections: BTreeMap<SessionId, Selection>,
	pub bidding_war: BiddingWarView,
	pub naming_progress: NamingView,
	pub talent_pool: Vec<Talent>,
	pub no_name_talent: NoNameRoster,
	pub awards: AwardsView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
	pub name: String,
	pub money: u32,
	pub score: u32,
	pub roles: Vec<Talent>,
	pub films: Vec<Film>,
	pub draft_package: Vec<i64>,
	pub missing_roles: Vec<Role>,
	pub connected: bool,
	pub timed_out: bool,
	pub spring_ready: bool,
	pub holiday_ready: bool,
	pub spring_releases_ready: bool,
	pub holiday_releases_ready: bool,
	pub bidding_results_ready: bool,
	pub awards_results_ready: bool,
}

/// Bids stay sealed until the war is resolved; until then only who has bid is shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiddingWarView {
	pub active: bool,
	pub card_index: Option<usize>,
	pub card_data: Option<Talent>,
	pub participants: Vec<SessionId>,
	pub submitted: Vec<SessionId>,
	pub bids: BTreeMap<SessionId, u32>,
	pub conflicts_queue: Vec<usize>,
	pub result: Option<BidResultView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BidResultView {
	Won {
		winner: SessionId,
		winner_name: String,
		amount: u32,
		total_cost: u32,
	},
	Tied {
		amount: u32,
	},
	Withdrawn,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamingView {
	pub submissions: BTreeMap<SessionId, NamingProgress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwardsView {
	pub current_category: Option<String>,
	pub categories: BTreeMap<String, CategoryView>,
	pub active_categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
	pub name: String,
	pub points_value: u32,
	pub nominees: Vec<Film>,
	pub electorate: Vec<SessionId>,
	pub voted: Vec<SessionId>,
	/// Revealed once the winner is known.
	pub votes: BTreeMap<SessionId, usize>,
	pub winner: Option<usize>,
}

impl GameSession {
	/// A player id with no player behind it is left out of the snapshot.
	fn session_of(&self, id: PlayerId) -> Option<SessionId> {
		let session = self.players.get(&id).map(|p| p.session);
		if session.is_none() {
			tracing::warn!(player = id.0, "snapshot refers to an unknown player");
		}
		session
	}

	fn sessions_of<'a>(&self, ids: impl IntoIterator<Item = &'a PlayerId>) -> Vec<SessionId> {
		ids.into_iter().filter_map(|id| self.session_of(*id)).collect()
	}

	pub fn snapshot(&self) -> GameSnapshot {
		GameSnapshot {
			phase: self.phase,
			players: self
				.players
				.values()
				.map(|p| (p.session, self.player_view(p)))
				.collect(),
			year: self.year,
			turn: self.turn,
			current_turn_cards: self.draft.cards.clone(),
			player_selections: self
				.draft
				.selections
				.iter()
				.filter_map(|(id, selection)| Some((self.session_of(*id)?, *selection)))
				.collect(),
			bidding_war: self.bidding_view(),
			naming_progress: NamingView {
				submissions: self
					.naming
					.iter()
					.filter_map(|(id, progress)| Some((self.session_of(*id)?, progress.clone())))
					.collect(),
			},
			talent_pool: self.talent_pool.clone(),
			no_name_talent: self.no_name.clone(),
			awards: self.awards_view(),
		}
	}

	fn player_view(&self, player: &Player) -> PlayerView {
		let ready = |checkpoint| self.readiness.is_marked(checkpoint, player.id);
		let staged = player
			.draft_package
			.iter()
			.filter_map(|r| self.resolve_role(player, *r))
			.map(|t| t.role)
			.collect::<Vec<_>>();

		PlayerView {
			name: player.name.clone(),
			money: player.money,
			score: player.score,
			roles: player.roles.clone(),
			films: player.films.clone(),
			draft_package: player.draft_package.iter().map(|r| r.to_index()).collect(),
			missing_roles: missing_roles(staged.iter().copied()),
			connected: player.connected,
			timed_out: player.timed_out,
			spring_ready: ready(Checkpoint::PackagingDone(Season::Winter)),
			holiday_ready: ready(Checkpoint::PackagingDone(Season::Summer)),
			spring_releases_ready: ready(Checkpoint::ReleasesSeen(Season::Winter)),
			holiday_releases_ready: ready(Checkpoint::ReleasesSeen(Season::Summer)),
			bidding_results_ready: ready(Checkpoint::BiddingResultsSeen),
			awards_results_ready: ready(Checkpoint::AwardsResultsSeen),
		}
	}

	fn bidding_view(&self) -> BiddingWarView {
		let conflicts_queue = self.bidding.queued_cards();
		let Some(war) = self.bidding.active.as_ref() else {
			return BiddingWarView {
				conflicts_queue,
				..BiddingWarView::default()
			};
		};

		let result = war.outcome.and_then(|outcome| {
			Some(match outcome {
				BidOutcome::Won { player, amount } => BidResultView::Won {
					winner: self.session_of(player)?,
					winner_name: self.player_name(player),
					amount,
					total_cost: war.card.salary.saturating_add(amount),
				},
				BidOutcome::Tied { amount } => BidResultView::Tied { amount },
				BidOutcome::Withdrawn => BidResultView::Withdrawn,
			})
		});
		let resolved = war.outcome.is_some();
		let bids = if resolved {
			war.bids
				.iter()
				.filter_map(|(id, bid)| Some((self.session_of(*id)?, *bid)))
				.collect()
		} else {
			BTreeMap::new()
		};

		BiddingWarView {
			active: true,
			card_index: Some(war.card_index),
			card_data: Some(war.card.clone()),
			participants: self.sessions_of(&war.participants),
			submitted: self.sessions_of(war.bids.keys()),
			bids,
			conflicts_queue,
			result,
		}
	}

	fn awards_view(&self) -> AwardsView {
		let Some(awards) = self.awards.as_ref() else {
			return AwardsView::default();
		};
		let current_category = match self.phase {
			Phase::AwardsVoting | Phase::AwardsResults => awards.current().map(|c| c.key.clone()),
			_ => None,
		};

		AwardsView {
			current_category,
			categories: awards
				.categories
				.iter()
				.map(|c| (c.key.clone(), self.category_view(c)))
				.collect(),
			active_categories: awards.categories.iter().map(|c| c.key.clone()).collect(),
		}
	}

	fn category_view(&self, category: &AwardCategory) -> CategoryView {
		let votes = if category.winner.is_some() {
			category
				.votes
				.iter()
				.filter_map(|(id, index)| Some((self.session_of(*id)?, *index)))
				.collect()
		} else {
			BTreeMap::new()
		};

		CategoryView {
			name: category.name.clone(),
			points_value: category.points_value,
			nominees: category.nominees.iter().map(|n| n.film.clone()).collect(),
			electorate: self.sessions_of(&category.electorate),
			voted: self.sessions_of(category.votes.keys()),
			votes,
			winner: category.winner,
		}
	}
}
