use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{GameError, GameResult};
use crate::session::packaging::Film;
use crate::talent::{RoleRef, Talent};

/// One transport connection. Changes when a player reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Session ids key most snapshot maps, so they also arrive as strings.
impl<'de> Deserialize<'de> for SessionId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct SessionIdVisitor;

		impl Visitor<'_> for SessionIdVisitor {
			type Value = SessionId;

			fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
				f.write_str("a session id")
			}

			fn visit_u64<E: de::Error>(self, v: u64) -> Result<SessionId, E> {
				Ok(SessionId(v))
			}

			fn visit_i64<E: de::Error>(self, v: i64) -> Result<SessionId, E> {
				u64::try_from(v)
					.map(SessionId)
					.map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
			}

			fn visit_str<E: de::Error>(self, v: &str) -> Result<SessionId, E> {
				v.parse()
					.map(SessionId)
					.map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
			}
		}

		deserializer.deserialize_any(SessionIdVisitor)
	}
}

/// `percent` of `amount`, rounded down. Percentages above 100 count as 100.
pub fn percent_of(amount: u32, percent: u32) -> u32 {
	let scaled = u64::from(amount) * u64::from(percent.min(100)) / 100;
	u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Stable identity of a studio for the whole game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

#[derive(Debug, Clone)]
pub struct Player {
	pub id: PlayerId,
	pub name: String,
	pub session: SessionId,
	pub money: u32,
	pub score: u32,
	pub roles: Vec<Talent>,
	pub films: Vec<Film>,
	pub draft_package: Vec<RoleRef>,
	pub connected: bool,
	pub last_seen: DateTime<Utc>,
	pub disconnected_at: Option<DateTime<Utc>>,
	pub timed_out: bool,
}

impl Player {
	pub fn new(id: PlayerId, name: String, session: SessionId, money: u32, now: DateTime<Utc>) -> Self {
		Self {
			id,
			name,
			session,
			money,
			score: 0,
			roles: Vec::new(),
			films: Vec::new(),
			draft_package: Vec::new(),
			connected: true,
			last_seen: now,
			disconnected_at: None,
			timed_out: false,
		}
	}

	/// Timed-out players no longer hold up the table.
	pub fn is_active(&self) -> bool {
		!self.timed_out
	}

	pub fn can_afford(&self, amount: u32) -> bool {
		self.money >= amount
	}

	/// Charges `amount` for `item`. Leaves the balance untouched on failure.
	pub fn debit(&mut self, item: &str, amount: u32) -> GameResult<u32> {
		if !self.can_afford(amount) {
			return Err(GameError::InsufficientFunds {
				name: item.to_string(),
				required: amount,
				available: self.money,
			});
		}
		self.money -= amount;
		Ok(self.money)
	}

	pub fn credit(&mut self, amount: u32) -> u32 {
		self.money = self.money.saturating_add(amount);
		self.money
	}

	pub fn mark_connected(&mut self, session: SessionId, now: DateTime<Utc>) {
		self.session = session;
		self.connected = true;
		self.last_seen = now;
		self.disconnected_at = None;
		self.timed_out = false;
	}

	pub fn mark_disconnected(&mut self, now: DateTime<Utc>) {
		self.connected = false;
		self.disconnected_at = Some(now);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn player(money: u32) -> Player {
		Player::new(PlayerId(0), "Ava".to_string(), SessionId(1), money, Utc::now())
	}

	#[test]
	fn test_debit_and_credit() {
		let mut p = player(100);
		assert_eq!(p.debit("Star", 30).unwrap(), 70);
		assert_eq!(p.credit(5), 75);
		assert_eq!(p.debit("Star", 75).unwrap(), 0);
	}

	#[test]
	fn test_debit_insufficient_leaves_balance() {
		let mut p = player(10);
		let err = p.debit("Dusty Hoffman", 11).unwrap_err();
		assert_eq!(
			err,
			GameError::InsufficientFunds {
				name: "Dusty Hoffman".to_string(),
				required: 11,
				available: 10,
			}
		);
		assert_eq!(p.money, 10);
	}

	#[test]
	fn test_percent_of_caps_and_never_overflows() {
		assert_eq!(percent_of(61, 50), 30);
		assert_eq!(percent_of(61, 0), 0);
		assert_eq!(percent_of(40, 250), 40);
		assert_eq!(percent_of(u32::MAX, u32::MAX), u32::MAX);
	}

	#[test]
	fn test_reconnect_clears_timeout() {
		let mut p = player(10);
		p.mark_disconnected(Utc::now());
		p.timed_out = true;
		assert!(!p.is_active());

		p.mark_connected(SessionId(9), Utc::now());
		assert!(p.is_active());
		assert!(p.connected);
		assert_eq!(p.session, SessionId(9));
		assert!(p.disconnected_at.is_none());
	}
}
