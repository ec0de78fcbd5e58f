use std::collections::{BTreeSet, HashMap};

use crate::session::phase::Season;
use crate::session::player::PlayerId;

/// Points where every active player has to acknowledge before the game moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
	PackagingDone(Season),
	ReleasesSeen(Season),
	BiddingResultsSeen,
	AwardsResultsSeen,
}

impl Checkpoint {
	pub const ALL: [Checkpoint; 6] = [
		Checkpoint::PackagingDone(Season::Winter),
		Checkpoint::PackagingDone(Season::Summer),
		Checkpoint::ReleasesSeen(Season::Winter),
		Checkpoint::ReleasesSeen(Season::Summer),
		Checkpoint::BiddingResultsSeen,
		Checkpoint::AwardsResultsSeen,
	];

	/// Name of the per-player flag shown to clients.
	pub fn flag(&self) -> &'static str {
		match self {
			Checkpoint::PackagingDone(Season::Winter) => "spring_ready",
			Checkpoint::PackagingDone(Season::Summer) => "holiday_ready",
			Checkpoint::ReleasesSeen(Season::Winter) => "spring_releases_ready",
			Checkpoint::ReleasesSeen(Season::Summer) => "holiday_releases_ready",
			Checkpoint::BiddingResultsSeen => "bidding_results_ready",
			Checkpoint::AwardsResultsSeen => "awards_results_ready",
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct Readiness {
	marks: HashMap<Checkpoint, BTreeSet<PlayerId>>,
}

impl Readiness {
	/// Returns false when the player had already acknowledged.
	pub fn mark(&mut self, checkpoint: Checkpoint, player: PlayerId) -> bool {
		self.marks.entry(checkpoint).or_default().insert(player)
	}

	pub fn is_marked(&self, checkpoint: Checkpoint, player: PlayerId) -> bool {
		self.marks
			.get(&checkpoint)
			.is_some_and(|set| set.contains(&player))
	}

	pub fn count(&self, checkpoint: Checkpoint) -> usize {
		self.marks.get(&checkpoint).map_or(0, |set| set.len())
	}

	pub fn clear(&mut self, checkpoint: Checkpoint) {
		self.marks.remove(&checkpoint);
	}

	pub fn clear_season(&mut self, season: Season) {
		self.clear(Checkpoint::PackagingDone(season));
		self.clear(Checkpoint::ReleasesSeen(season));
	}
}
