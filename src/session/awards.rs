use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::content::AwardCategoryConfig;
use crate::error::{GameError, GameResult};
use crate::logging;
use crate::session::{Checkpoint, Film, GameSession, Phase, PlayerId, Season, SessionId};

#[derive(Debug, Clone)]
pub struct Nominee {
	pub owner: PlayerId,
	pub film: Film,
}

#[derive(Debug, Clone)]
pub struct AwardCategory {
	pub key: String,
	pub name: String,
	pub points_value: u32,
	pub nominees: Vec<Nominee>,
	/// Players allowed to vote: active when voting opened and with a rival nominee.
	pub electorate: Vec<PlayerId>,
	pub votes: BTreeMap<PlayerId, usize>,
	/// Index into `nominees`.
	pub winner: Option<usize>,
}

impl AwardCategory {
	fn new(config: &AwardCategoryConfig, nominees: Vec<Nominee>) -> Self {
		Self {
			key: config.key.clone(),
			name: config.name.clone(),
			points_value: config.points_value,
			nominees,
			electorate: Vec::new(),
			votes: BTreeMap::new(),
			winner: None,
		}
	}
}

/// Award season: categories run strictly one after another.
#[derive(Debug, Clone, Default)]
pub struct Awards {
	pub categories: Vec<AwardCategory>,
	pub current: usize,
}

impl Awards {
	pub fn current(&self) -> Option<&AwardCategory> {
		self.categories.get(self.current)
	}

	fn current_mut(&mut self) -> Option<&mut AwardCategory> {
		self.categories.get_mut(self.current)
	}
}

/// Best `limit` films by prestige, then box office, then greenlight order.
pub fn rank_nominees(mut films: Vec<Nominee>, limit: usize) -> Vec<Nominee> {
	films.sort_by_key(|n| {
		(
			Reverse(n.film.prestige),
			Reverse(n.film.box_office.unwrap_or(0)),
			n.film.order,
		)
	});
	films.truncate(limit);
	films
}

/// Most votes wins; a tie goes to the best-ranked (lowest index) nominee.
/// With no votes at all the top nominee wins.
pub fn tally(votes: &BTreeMap<PlayerId, usize>, nominees: usize) -> usize {
	let mut counts = vec![0usize; nominees];
	for &index in votes.values() {
		if let Some(count) = counts.get_mut(index) {
			*count += 1;
		}
	}
	let best = counts.iter().copied().max().unwrap_or(0);
	counts.iter().position(|&c| c == best).unwrap_or(0)
}

impl GameSession {
	pub fn start_awards(&mut self, session: SessionId) -> GameResult<()> {
		let allowed = self.phase == Phase::Releases(Season::Summer);
		self.acknowledge(session, "start_awards", Checkpoint::ReleasesSeen(Season::Summer), allowed)
	}

	pub(super) fn try_open_awards(&mut self) -> bool {
		if !self.all_ready(Checkpoint::ReleasesSeen(Season::Summer)) {
			return false;
		}
		self.readiness.clear_season(Season::Summer);

		let films: Vec<Nominee> = self
			.players
			.values()
			.flat_map(|p| {
				p.films.iter().map(move |f| Nominee {
					owner: p.id,
					film: f.clone(),
				})
			})
			.collect();

		let mut categories = Vec::new();
		for config in &self.content.award_categories {
			let eligible: Vec<Nominee> = films
				.iter()
				.filter(|n| config.eligibility.admits(&n.film.genre, &n.film.audience))
				.cloned()
				.collect();
			let nominees = rank_nominees(eligible, self.rules.nominees_per_category);
			if nominees.is_empty() {
				logging::awards::category_skipped(&config.name);
				continue;
			}
			categories.push(AwardCategory::new(config, nominees));
		}

		let nothing_to_award = categories.is_empty();
		self.awards = Some(Awards {
			categories,
			current: 0,
		});
		if nothing_to_award {
			self.enter(Phase::GameComplete);
		} else {
			self.open_category();
		}
		true
	}

	fn open_category(&mut self) {
		let active: Vec<PlayerId> = self
			.players
			.values()
			.filter(|p| p.is_active())
			.map(|p| p.id)
			.collect();
		let Some(category) = self.awards.as_mut().and_then(|a| a.current_mut()) else {
			return;
		};

		category.electorate = active
			.into_iter()
			.filter(|id| category.nominees.iter().any(|n| n.owner != *id))
			.collect();
		category.votes.clear();
		category.winner = None;
		logging::awards::category_opened(&category.name, category.nominees.len(), category.electorate.len());
		self.enter(Phase::AwardsVoting);
	}

	pub fn vote(&mut self, session: SessionId, nominee_index: usize) -> GameResult<()> {
		self.require("vote_for_nominee", self.phase == Phase::AwardsVoting)?;
		let id = self.player_id(session)?;
		let voter = self.player(id)?.name.clone();
		let category = self
			.awards
			.as_mut()
			.and_then(|a| a.current_mut())
			.ok_or(GameError::InvalidPhaseAction {
				action: "vote_for_nominee",
				phase: Phase::AwardsVoting.tag(),
			})?;

		let nominee = category
			.nominees
			.get(nominee_index)
			.ok_or(GameError::InvalidNominee { index: nominee_index })?;
		if nominee.owner == id {
			return Err(GameError::SelfVoteForbidden);
		}
		if !category.electorate.contains(&id) {
			return Err(GameError::NotInElectorate);
		}
		if category.votes.contains_key(&id) {
			return Err(GameError::AlreadyVoted);
		}

		logging::awards::vote(&voter, &nominee.film.title);
		category.votes.insert(id, nominee_index);
		self.settle();
		Ok(())
	}

	pub(super) fn try_resolve_category(&mut self) -> bool {
		let Some(category) = self.awards.as_ref().and_then(|a| a.current()) else {
			return false;
		};
		if category.winner.is_some() {
			return false;
		}
		if !self.all_active_done(category.electorate.iter().copied(), |id| category.votes.contains_key(&id)) {
			return false;
		}

		let winner = tally(&category.votes, category.nominees.len());
		let Some(nominee) = category.nominees.get(winner) else {
			return false;
		};
		let owner = nominee.owner;
		let points = category.points_value;
		let (name, title, studio) = (category.name.clone(), nominee.film.title.clone(), nominee.film.studio.clone());

		if let Some(player) = self.players.get_mut(&owner) {
			player.score += points;
		}
		logging::awards::winner(&name, &title, &studio, points);

		if let Some(category) = self.awards.as_mut().and_then(|a| a.current_mut()) {
			category.winner = Some(winner);
		}
		self.enter(Phase::AwardsResults);
		true
	}

	pub fn continue_from_awards(&mut self, session: SessionId) -> GameResult<()> {
		let allowed = self.phase == Phase::AwardsResults;
		self.acknowledge(session, "continue_from_awards", Checkpoint::AwardsResultsSeen, allowed)
	}

	pub(super) fn try_next_category(&mut self) -> bool {
		if !self.all_ready(Checkpoint::AwardsResultsSeen) {
			return false;
		}
		self.readiness.clear(Checkpoint::AwardsResultsSeen);

		let more = match self.awards.as_mut() {
			Some(awards) if awards.current + 1 < awards.categories.len() => {
				awards.current += 1;
				true
			}
			_ => false,
		};
		if more {
			self.open_category();
		} else {
			self.enter(Phase::GameComplete);
		}
		true
	}
}
