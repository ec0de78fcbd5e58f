use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GameError;
use crate::session::{GameSnapshot, Selection};

/// Frames larger than this are refused and the connection dropped.
pub const MAX_FRAME_LEN: usize = 1 << 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
	JoinGame {
		name: String,
	},
	#[serde(rename = "start_phase0")]
	StartPhase0,
	SubmitTalentName {
		#[serde(default)]
		name: String,
	},
	#[serde(rename = "start_phase1")]
	StartPhase1,
	SelectCard {
		index: Selection,
	},
	SubmitBid {
		#[serde(default)]
		bid_amount: i64,
	},
	ToggleRole {
		index: i64,
	},
	GreenlightFilm {
		#[serde(rename = "roleIndices")]
		role_indices: Vec<i64>,
		title: String,
		#[serde(default)]
		teaser: String,
	},
	FinishPackaging,
	VoteForNominee {
		nominee_index: usize,
	},
	ContinueToSummer,
	StartAwards,
	ContinueAfterBidding,
	ContinueFromAwards,
	RequestUpdate,
	Heartbeat {
		#[serde(default)]
		name: Option<String>,
	},
}

impl ClientMessage {
	pub fn kind(&self) -> &'static str {
		match self {
			ClientMessage::JoinGame { .. } => "join_game",
			ClientMessage::StartPhase0 => "start_phase0",
			ClientMessage::SubmitTalentName { .. } => "submit_talent_name",
			ClientMessage::StartPhase1 => "start_phase1",
			ClientMessage::SelectCard { .. } => "select_card",
			ClientMessage::SubmitBid { .. } => "submit_bid",
			ClientMessage::ToggleRole { .. } => "toggle_role",
			ClientMessage::GreenlightFilm { .. } => "greenlight_film",
			ClientMessage::FinishPackaging => "finish_packaging",
			ClientMessage::VoteForNominee { .. } => "vote_for_nominee",
			ClientMessage::ContinueToSummer => "continue_to_summer",
			ClientMessage::StartAwards => "start_awards",
			ClientMessage::ContinueAfterBidding => "continue_after_bidding",
			ClientMessage::ContinueFromAwards => "continue_from_awards",
			ClientMessage::RequestUpdate => "request_update",
			ClientMessage::Heartbeat { .. } => "heartbeat",
		}
	}

	/// The rejection goes back on the channel the sender's screen listens to.
	pub fn rejection(&self, err: &GameError) -> ServerMessage {
		let message = err.to_string();
		match self {
			ClientMessage::SelectCard { .. } => ServerMessage::SelectionError { message },
			ClientMessage::SubmitBid { .. } => ServerMessage::BidError { message },
			ClientMessage::ToggleRole { .. }
			| ClientMessage::GreenlightFilm { .. }
			| ClientMessage::FinishPackaging => ServerMessage::PackageError { message },
			ClientMessage::VoteForNominee { .. } => ServerMessage::VoteError { message },
			_ => ServerMessage::Error { message },
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
	Joined,
	GameUpdate {
		snapshot: Box<GameSnapshot>,
	},
	SelectionError {
		message: String,
	},
	BidError {
		message: String,
	},
	PackageError {
		message: String,
	},
	VoteError {
		message: String,
	},
	Error {
		message: String,
	},
}

#[derive(Debug, Error)]
pub enum FrameError {
	#[error("frame of {len} bytes exceeds the {max} byte limit")]
	TooLarge { len: usize, max: usize },

	#[error("malformed message: {0}")]
	Json(#[from] serde_json::Error),
}

pub fn encode_message<T: Serialize>(msg: &T) -> Result<Vec<u8>, FrameError> {
	let json = serde_json::to_vec(msg)?;
	if json.len() > MAX_FRAME_LEN {
		return Err(FrameError::TooLarge {
			len: json.len(),
			max: MAX_FRAME_LEN,
		});
	}
	let mut buf = (json.len() as u32).to_be_bytes().to_vec();
	buf.extend(json);
	Ok(buf)
}

pub fn decode_length(buf: &[u8]) -> Option<u32> {
	if buf.len() < 4 {
		return None;
	}
	Some(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

/// Pops one complete frame off the front of `buf`. `None` means more bytes are needed.
/// A bad payload is consumed and reported; an oversized header is reported and left in place.
pub fn try_decode_message<T: DeserializeOwned>(buf: &mut Vec<u8>) -> Option<Result<T, FrameError>> {
	let len = decode_length(buf)? as usize;
	if len > MAX_FRAME_LEN {
		return Some(Err(FrameError::TooLarge {
			len,
			max: MAX_FRAME_LEN,
		}));
	}
	if buf.len() < 4 + len {
		return None;
	}
	let decoded = serde_json::from_slice(&buf[4..4 + len]).map_err(FrameError::from);
	buf.drain(..4 + len);
	Some(decoded)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn payload(encoded: &[u8]) -> &str {
		std::str::from_utf8(&encoded[4..]).unwrap()
	}

	#[test]
	fn test_encode_decode_length() {
		let msg = ClientMessage::JoinGame { name: "test".to_string() };
		let encoded = encode_message(&msg).unwrap();

		let len = decode_length(&encoded).expect("Should decode length");
		assert_eq!(len as usize, encoded.len() - 4);
	}

	#[test]
	fn test_client_message_tags() {
		let cases = [
			(r#"{"type":"join_game","name":"Ava"}"#, "join_game"),
			(r#"{"type":"start_phase0"}"#, "start_phase0"),
			(r#"{"type":"start_phase1"}"#, "start_phase1"),
			(r#"{"type":"select_card","index":"pass"}"#, "select_card"),
			(r#"{"type":"submit_bid","bid_amount":5}"#, "submit_bid"),
			(r#"{"type":"toggle_role","index":-2}"#, "toggle_role"),
			(r#"{"type":"finish_packaging"}"#, "finish_packaging"),
			(r#"{"type":"vote_for_nominee","nominee_index":1}"#, "vote_for_nominee"),
			(r#"{"type":"continue_after_bidding"}"#, "continue_after_bidding"),
			(r#"{"type":"heartbeat","name":"Ava"}"#, "heartbeat"),
		];
		for (json, kind) in cases {
			let msg: ClientMessage = serde_json::from_str(json).unwrap();
			assert_eq!(msg.kind(), kind);
		}
	}

	#[test]
	fn test_greenlight_uses_camel_case_indices() {
		let json = r#"{"type":"greenlight_film","roleIndices":[0,-1,2,3],"title":"Heat"}"#;
		match serde_json::from_str::<ClientMessage>(json).unwrap() {
			ClientMessage::GreenlightFilm { role_indices, title, teaser } => {
				assert_eq!(role_indices, vec![0, -1, 2, 3]);
				assert_eq!(title, "Heat");
				assert_eq!(teaser, "");
			}
			other => panic!("Wrong message type: {:?}", other),
		}
	}

	#[test]
	fn test_select_card_index_or_pass() {
		match serde_json::from_str::<ClientMessage>(r#"{"type":"select_card","index":2}"#).unwrap() {
			ClientMessage::SelectCard { index } => assert_eq!(index, Selection::Card(2)),
			other => panic!("Wrong message type: {:?}", other),
		}
	}

	#[test]
	fn test_rejections_use_matching_channel() {
		let err = GameError::DuplicateSelection;
		let msg = ClientMessage::SelectCard { index: Selection::Pass }.rejection(&err);
		let json = serde_json::to_string(&msg).unwrap();
		assert!(json.contains("selection_error"));
		assert!(json.contains("already made your selection"));

		let msg = ClientMessage::FinishPackaging.rejection(&GameError::AlreadyFinished);
		assert!(matches!(msg, ServerMessage::PackageError { .. }));
		let msg = ClientMessage::VoteForNominee { nominee_index: 0 }.rejection(&GameError::SelfVoteForbidden);
		assert!(matches!(msg, ServerMessage::VoteError { .. }));
		let msg = ClientMessage::StartPhase0.rejection(&GameError::NotJoined);
		assert!(matches!(msg, ServerMessage::Error { .. }));
	}

	#[test]
	fn test_joined_is_bare_tag() {
		let encoded = encode_message(&ServerMessage::Joined).unwrap();
		assert_eq!(payload(&encoded), r#"{"type":"joined"}"#);
	}

	#[test]
	fn test_game_update_decodes_on_client_side() {
		let mut session = crate::session::testing::drafting(&["Ava", "Ben"], 9);
		session.select_card(crate::session::testing::sid(1), Selection::Pass).unwrap();
		let snapshot = session.snapshot();

		let mut buf = encode_message(&ServerMessage::GameUpdate {
			snapshot: Box::new(snapshot.clone()),
		})
		.unwrap();
		assert!(payload(&buf).starts_with(r#"{"type":"game_update""#));

		match try_decode_message::<ServerMessage>(&mut buf).unwrap().unwrap() {
			ServerMessage::GameUpdate { snapshot: decoded } => assert_eq!(*decoded, snapshot),
			other => panic!("Wrong message type: {:?}", other),
		}
	}

	#[test]
	fn test_try_decode_waits_for_full_frame() {
		let encoded = encode_message(&ClientMessage::RequestUpdate).unwrap();
		let mut buf = encoded[..encoded.len() - 1].to_vec();
		assert!(try_decode_message::<ClientMessage>(&mut buf).is_none());

		buf.push(*encoded.last().unwrap());
		buf.extend(encode_message(&ClientMessage::StartAwards).unwrap());
		let first = try_decode_message::<ClientMessage>(&mut buf).unwrap().unwrap();
		assert_eq!(first.kind(), "request_update");
		let second = try_decode_message::<ClientMessage>(&mut buf).unwrap().unwrap();
		assert_eq!(second.kind(), "start_awards");
		assert!(buf.is_empty());
	}

	#[test]
	fn test_malformed_frame_is_consumed() {
		let body = br#"{"type":"launch_rockets"}"#;
		let mut buf = (body.len() as u32).to_be_bytes().to_vec();
		buf.extend_from_slice(body);
		buf.extend(encode_message(&ClientMessage::RequestUpdate).unwrap());

		let bad = try_decode_message::<ClientMessage>(&mut buf).unwrap();
		assert!(matches!(bad, Err(FrameError::Json(_))));
		let good = try_decode_message::<ClientMessage>(&mut buf).unwrap().unwrap();
		assert_eq!(good.kind(), "request_update");
	}

	#[test]
	fn test_oversized_frame_rejected() {
		let mut buf = ((MAX_FRAME_LEN + 1) as u32).to_be_bytes().to_vec();
		buf.extend_from_slice(b"{}");
		assert!(matches!(
			try_decode_message::<ClientMessage>(&mut buf),
			Some(Err(FrameError::TooLarge { .. }))
		));
	}
}
