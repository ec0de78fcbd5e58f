use thiserror::Error;

use crate::talent::Role;

/// Rejections of a player action. Every variant is recoverable: the session
/// is left untouched and only the sender hears about it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
	#[error("{action} is not allowed during {phase}")]
	InvalidPhaseAction { action: &'static str, phase: &'static str },

	#[error("You have already made your selection for this turn!")]
	DuplicateSelection,

	#[error("Invalid card selection!")]
	InvalidCard { index: usize },

	#[error("Can't afford {name}! Need ${required}M but only have ${available}M")]
	InsufficientFunds {
		name: String,
		required: u32,
		available: u32,
	},

	#[error("You are not a participant in this bidding war!")]
	NotParticipant,

	#[error("{reason}")]
	InvalidBid { reason: String },

	#[error("Film title is required!")]
	MissingTitle,

	#[error("Invalid role reference {index}")]
	InvalidRoleRef { index: i64 },

	#[error("Invalid package! Missing: {}", role_list(.missing))]
	IncompletePackage { missing: Vec<Role> },

	#[error("Invalid package! Only one {role} allowed")]
	DuplicateRole { role: Role },

	#[error("You have already finished packaging!")]
	AlreadyFinished,

	#[error("Invalid nominee selection!")]
	InvalidNominee { index: usize },

	#[error("Cannot vote for your own film!")]
	SelfVoteForbidden,

	#[error("You have already voted in this category!")]
	AlreadyVoted,

	#[error("You have no eligible nominee to vote for in this category")]
	NotInElectorate,

	#[error("Join the game first")]
	NotJoined,

	#[error("This connection already plays as {name}")]
	AlreadyJoined { name: String },

	#[error("Player name is required")]
	MissingName,

	#[error("All your talent names are already in")]
	NamingComplete,

	#[error("Need at least {required} players, have {joined}")]
	NotEnoughPlayers { required: usize, joined: usize },
}

fn role_list(roles: &[Role]) -> String {
	roles.iter().map(|r| r.label()).collect::<Vec<_>>().join(", ")
}

pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_incomplete_package_lists_missing_roles() {
		let err = GameError::IncompletePackage {
			missing: vec![Role::Director, Role::Star],
		};
		let msg = err.to_string();
		assert!(msg.contains("Director"));
		assert!(msg.contains("Star"));
	}

	#[test]
	fn test_insufficient_funds_display() {
		let err = GameError::InsufficientFunds {
			name: "Dusty Hoffman".to_string(),
			required: 25,
			available: 10,
		};
		let msg = err.to_string();
		assert!(msg.contains("Dusty Hoffman"));
		assert!(msg.contains("25"));
		assert!(msg.contains("10"));
	}

	#[test]
	fn test_phase_action_display() {
		let err = GameError::InvalidPhaseAction {
			action: "submit_bid",
			phase: "lobby",
		};
		assert_eq!(err.to_string(), "submit_bid is not allowed during lobby");
	}
}
