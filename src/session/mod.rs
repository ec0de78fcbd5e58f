//! The authoritative game session. One owner mutates it; every accepted
//! action re-runs [`GameSession::settle`] so gates advance as soon as the
//! last active player is in.

mod awards;
mod bidding;
mod box_office;
mod draft;
mod naming;
mod packaging;
mod phase;
mod player;
mod readiness;
mod roster;
mod snapshot;

pub use awards::{AwardCategory, Awards, Nominee};
pub use bidding::{BidOutcome, BiddingState, BiddingWar};
pub use box_office::Performance;
pub use draft::{Draft, Selection};
pub use naming::NamingProgress;
pub use packaging::Film;
pub use phase::{Phase, Season};
pub use player::{Player, PlayerId, SessionId};
pub use readiness::{Checkpoint, Readiness};
pub use roster::JoinOutcome;
pub use snapshot::{
	AwardsView, BidResultView, BiddingWarView, CategoryView, GameSnapshot, NamingView, PlayerView,
};

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{BTreeMap, HashMap};

use crate::config::GameRules;
use crate::content::ContentTables;
use crate::error::{GameError, GameResult};
use crate::logging;
use crate::talent::{NoNameRoster, Talent, TalentIds};

/// Upper bound on chained automatic transitions inside one settle pass.
const MAX_SETTLE_STEPS: usize = 64;

pub struct GameSession {
	rules: GameRules,
	content: ContentTables,
	rng: StdRng,
	ids: TalentIds,
	phase: Phase,
	year: u32,
	turn: u32,
	players: BTreeMap<PlayerId, Player>,
	sessions: HashMap<SessionId, PlayerId>,
	next_player: u32,
	naming: BTreeMap<PlayerId, NamingProgress>,
	talent_pool: Vec<Talent>,
	no_name: NoNameRoster,
	draft: Draft,
	bidding: BiddingState,
	readiness: Readiness,
	awards: Option<Awards>,
	greenlit: u64,
}

impl GameSession {
	pub fn new(rules: GameRules, content: ContentTables) -> Self {
		let rng = match rules.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		let mut ids = TalentIds::default();
		let no_name = NoNameRoster::from_content(&content, &mut ids);

		Self {
			rules,
			content,
			rng,
			ids,
			phase: Phase::Lobby,
			year: 0,
			turn: 0,
			players: BTreeMap::new(),
			sessions: HashMap::new(),
			next_player: 0,
			naming: BTreeMap::new(),
			talent_pool: Vec::new(),
			no_name,
			draft: Draft::default(),
			bidding: BiddingState::default(),
			readiness: Readiness::default(),
			awards: None,
			greenlit: 0,
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn year(&self) -> u32 {
		self.year
	}

	pub fn turn(&self) -> u32 {
		self.turn
	}

	pub fn rules(&self) -> &GameRules {
		&self.rules
	}

	pub fn players(&self) -> impl Iterator<Item = &Player> {
		self.players.values()
	}

	pub fn player_by_name(&self, name: &str) -> Option<&Player> {
		self.players.values().find(|p| p.name == name)
	}

	pub fn player_for(&self, session: SessionId) -> Option<&Player> {
		self.sessions.get(&session).and_then(|id| self.players.get(id))
	}

	pub fn talent_pool(&self) -> &[Talent] {
		&self.talent_pool
	}

	pub fn current_cards(&self) -> &[Talent] {
		&self.draft.cards
	}

	pub fn no_name(&self) -> &NoNameRoster {
		&self.no_name
	}

	pub fn bidding_war(&self) -> Option<&BiddingWar> {
		self.bidding.active.as_ref()
	}

	pub fn awards(&self) -> Option<&Awards> {
		self.awards.as_ref()
	}

	fn player_id(&self, session: SessionId) -> GameResult<PlayerId> {
		self.sessions.get(&session).copied().ok_or(GameError::NotJoined)
	}

	fn player(&self, id: PlayerId) -> GameResult<&Player> {
		self.players.get(&id).ok_or(GameError::NotJoined)
	}

	fn player_name(&self, id: PlayerId) -> String {
		self.players
			.get(&id)
			.map(|p| p.name.clone())
			.unwrap_or_default()
	}

	fn require(&self, action: &'static str, allowed: bool) -> GameResult<()> {
		if allowed {
			Ok(())
		} else {
			Err(GameError::InvalidPhaseAction {
				action,
				phase: self.phase.tag(),
			})
		}
	}

	fn enter(&mut self, next: Phase) -> bool {
		if self.phase == next {
			return true;
		}
		if !self.phase.can_transition_to(next) {
			logging::session::illegal_transition(self.phase.tag(), next.tag());
			return false;
		}
		logging::session::phase(self.phase.tag(), next.tag());
		self.phase = next;
		true
	}

	fn is_active(&self, id: PlayerId) -> bool {
		self.players.get(&id).is_some_and(|p| p.is_active())
	}

	fn active_count(&self) -> usize {
		self.players.values().filter(|p| p.is_active()).count()
	}

	/// True when every active member of `group` is `done` and the table still
	/// has someone active. A table of only timed-out players stays paused.
	fn all_active_done<I, F>(&self, group: I, done: F) -> bool
	where
		I: IntoIterator<Item = PlayerId>,
		F: Fn(PlayerId) -> bool,
	{
		self.active_count() > 0
			&& group
				.into_iter()
				.filter(|id| self.is_active(*id))
				.all(done)
	}

	fn all_ready(&self, checkpoint: Checkpoint) -> bool {
		self.all_active_done(self.players.keys().copied(), |id| {
			self.readiness.is_marked(checkpoint, id)
		})
	}

	fn acknowledge(
		&mut self,
		session: SessionId,
		action: &'static str,
		checkpoint: Checkpoint,
		allowed: bool,
	) -> GameResult<()> {
		self.require(action, allowed)?;
		let id = self.player_id(session)?;
		if self.readiness.mark(checkpoint, id) {
			self.log_ready(id, checkpoint);
		}
		self.settle();
		Ok(())
	}

	fn log_ready(&self, id: PlayerId, checkpoint: Checkpoint) {
		let ready = self
			.players
			.values()
			.filter(|p| p.is_active() && self.readiness.is_marked(checkpoint, p.id))
			.count();
		logging::session::ready(&self.player_name(id), checkpoint.flag(), ready, self.active_count());
	}

	/// Runs every automatic transition whose gate is now open.
	pub fn settle(&mut self) {
		for _ in 0..MAX_SETTLE_STEPS {
			if !self.step() {
				return;
			}
		}
		tracing::warn!(phase = self.phase.tag(), "settle did not reach a resting phase");
	}

	fn step(&mut self) -> bool {
		match self.phase {
			Phase::Naming => self.try_finish_naming(),
			Phase::Production(_) => self.try_resolve_selections(),
			Phase::Bidding(_) => self.try_resolve_war(),
			Phase::BiddingResults(_) => self.try_leave_bidding_results(),
			Phase::Packaging(season) => self.try_release(season),
			Phase::Releases(Season::Winter) => self.try_start_summer(),
			Phase::Releases(Season::Summer) => self.try_open_awards(),
			Phase::AwardsVoting => self.try_resolve_category(),
			Phase::AwardsResults => self.try_next_category(),
			Phase::Lobby | Phase::NamingComplete | Phase::GameComplete => false,
		}
	}
}
