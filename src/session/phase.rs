use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The two production seasons of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
	Winter,
	Summer,
}

impl Season {
	pub fn number(&self) -> u8 {
		match self {
			Season::Winter => 1,
			Season::Summer => 2,
		}
	}

	/// Name of the release window that follows the season.
	pub fn release_name(&self) -> &'static str {
		match self {
			Season::Winter => "Spring",
			Season::Summer => "Holiday",
		}
	}
}

impl fmt::Display for Season {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Season::Winter => write!(f, "Winter"),
			Season::Summer => write!(f, "Summer"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
	Lobby,
	Naming,
	NamingComplete,
	Production(Season),
	Bidding(Season),
	BiddingResults(Season),
	Packaging(Season),
	Releases(Season),
	AwardsVoting,
	AwardsResults,
	GameComplete,
}

impl Phase {
	pub const ALL: [Phase; 16] = [
		Phase::Lobby,
		Phase::Naming,
		Phase::NamingComplete,
		Phase::Production(Season::Winter),
		Phase::Bidding(Season::Winter),
		Phase::BiddingResults(Season::Winter),
		Phase::Packaging(Season::Winter),
		Phase::Releases(Season::Winter),
		Phase::Production(Season::Summer),
		Phase::Bidding(Season::Summer),
		Phase::BiddingResults(Season::Summer),
		Phase::Packaging(Season::Summer),
		Phase::Releases(Season::Summer),
		Phase::AwardsVoting,
		Phase::AwardsResults,
		Phase::GameComplete,
	];

	pub fn tag(&self) -> &'static str {
		use Season::*;
		match self {
			Phase::Lobby => "lobby",
			Phase::Naming => "phase0_naming",
			Phase::NamingComplete => "phase0_complete",
			Phase::Production(Winter) => "phase1_production",
			Phase::Bidding(Winter) => "phase1_bidding",
			Phase::BiddingResults(Winter) => "phase1_bidding_results",
			Phase::Packaging(Winter) => "phase1_packaging",
			Phase::Releases(Winter) => "phase1_releases",
			Phase::Production(Summer) => "phase2_production",
			Phase::Bidding(Summer) => "phase2_bidding",
			Phase::BiddingResults(Summer) => "phase2_bidding_results",
			Phase::Packaging(Summer) => "phase2_packaging",
			Phase::Releases(Summer) => "phase2_releases",
			Phase::AwardsVoting => "awards_voting",
			Phase::AwardsResults => "awards_results",
			Phase::GameComplete => "game_complete",
		}
	}

	pub fn from_tag(tag: &str) -> Option<Phase> {
		Phase::ALL.iter().copied().find(|p| p.tag() == tag)
	}

	pub fn season(&self) -> Option<Season> {
		match self {
			Phase::Production(s)
			| Phase::Bidding(s)
			| Phase::BiddingResults(s)
			| Phase::Packaging(s)
			| Phase::Releases(s) => Some(*s),
			_ => None,
		}
	}

	/// Legal edges of the session state machine. Staying put is always allowed.
	pub fn can_transition_to(&self, next: Phase) -> bool {
		use Phase::*;
		if *self == next {
			return true;
		}
		match (*self, next) {
			(Lobby, Naming) => true,
			(Naming, NamingComplete) => true,
			(NamingComplete, Production(Season::Winter)) => true,
			(Production(a), Bidding(b)) | (Production(a), Packaging(b)) => a == b,
			(Bidding(a), BiddingResults(b)) => a == b,
			(BiddingResults(a), Bidding(b))
			| (BiddingResults(a), Production(b))
			| (BiddingResults(a), Packaging(b)) => a == b,
			(Packaging(a), Releases(b)) => a == b,
			(Releases(Season::Winter), Production(Season::Summer)) => true,
			(Releases(Season::Summer), AwardsVoting) => true,
			(Releases(Season::Summer), GameComplete) => true,
			(AwardsVoting, AwardsResults) => true,
			(AwardsResults, AwardsVoting) => true,
			(AwardsResults, GameComplete) => true,
			_ => false,
		}
	}
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.tag())
	}
}

impl Serialize for Phase {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.tag())
	}
}

impl<'de> Deserialize<'de> for Phase {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let tag = String::deserialize(deserializer)?;
		Phase::from_tag(&tag).ok_or_else(|| serde::de::Error::custom(format!("unknown phase '{}'", tag)))
	}
}
