use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::logging;
use crate::session::player::percent_of;
use crate::session::{GameSession, Season};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Performance {
	Hit,
	Success,
	Modest,
}

impl Performance {
	pub fn of(box_office: u32) -> Self {
		if box_office > 100 {
			Performance::Hit
		} else if box_office > 50 {
			Performance::Success
		} else {
			Performance::Modest
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Performance::Hit => "Hit",
			Performance::Success => "Success",
			Performance::Modest => "Modest",
		}
	}
}

/// Market base plus a uniform swing of `jitter`, floored at 0.1 and rounded to a tenth.
pub fn market_multiplier<R: Rng>(base: f32, jitter: f32, rng: &mut R) -> f32 {
	let swing = if jitter > 0.0 {
		rng.random_range(-jitter..=jitter)
	} else {
		0.0
	};
	((base + swing).max(0.1) * 10.0).round() / 10.0
}

pub fn gross(heat: u32, multiplier: f32) -> u32 {
	(heat as f32 * multiplier).round() as u32
}

impl GameSession {
	/// Opens every unreleased film of `season`, in studio order.
	pub(super) fn run_releases(&mut self, season: Season) {
		let share = self.rules.revenue_share_percent;
		let jitter = self.rules.multiplier_jitter;

		for player in self.players.values_mut() {
			let mut earnings = 0u32;
			for film in player
				.films
				.iter_mut()
				.filter(|f| f.season == season && f.box_office.is_none())
			{
				let base = self.content.base_multiplier(&film.genre, &film.audience);
				let multiplier = market_multiplier(base, jitter, &mut self.rng);
				let takings = gross(film.heat, multiplier);
				let performance = Performance::of(takings);

				film.multiplier = Some(multiplier);
				film.box_office = Some(takings);
				film.performance = Some(performance);
				player.score = player.score.saturating_add(takings);
				earnings = earnings.saturating_add(percent_of(takings, share));

				logging::box_office::film(
					&player.name,
					&film.title,
					film.heat,
					multiplier,
					takings,
					performance.label(),
				);
			}
			player.credit(earnings);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::testing::*;
	use crate::session::{Film, Phase};
	use crate::talent::{Role, Talent, TalentId};
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn test_performance_labels() {
		assert_eq!(Performance::of(101), Performance::Hit);
		assert_eq!(Performance::of(100), Performance::Success);
		assert_eq!(Performance::of(51), Performance::Success);
		assert_eq!(Performance::of(50), Performance::Modest);
	}

	#[test]
	fn test_multiplier_bounds() {
		let mut rng = StdRng::seed_from_u64(1);
		for _ in 0..500 {
			let m = market_multiplier(1.6, 0.2, &mut rng);
			assert!((1.4..=1.8).contains(&m), "{}", m);
			assert_eq!((m * 10.0).round() / 10.0, m);
		}
		assert_eq!(market_multiplier(0.0, 0.05, &mut rng), 0.1);
		assert_eq!(market_multiplier(1.25, 0.0, &mut rng), 1.3);
	}

	#[test]
	fn test_gross_rounds() {
		assert_eq!(gross(100, 1.5), 150);
		assert_eq!(gross(33, 1.5), 50);
		assert_eq!(gross(0, 2.0), 0);
	}

	fn film(season: Season, heat: u32) -> Film {
		let roles = vec![
			Talent::new(TalentId(1), "P", Role::Producer, 0, 0, 1).with_genre("Action"),
			Talent::new(TalentId(2), "W", Role::Screenwriter, heat, 10, 1).with_audience("Teens"),
			Talent::new(TalentId(3), "D", Role::Director, 0, 10, 1),
			Talent::new(TalentId(4), "S", Role::Star, 0, 10, 1),
		];
		Film::from_roles("Film", "", roles, "Ava", season, 1)
	}

	fn releasing(seed: u64) -> GameSession {
		let mut r = rules(seed);
		r.multiplier_jitter = 0.0;
		let mut session = session_with(r, &["Ava", "Ben"]);
		force_phase(&mut session, Phase::Packaging(Season::Winter));
		let id = id_of(&session, 1);
		if let Some(p) = session.players.get_mut(&id) {
			p.films.push(film(Season::Winter, 100));
			p.films.push(film(Season::Summer, 100));
		}
		session
	}

	#[test]
	fn test_release_scores_current_season_only() {
		let mut session = releasing(4);
		session.run_releases(Season::Winter);

		let ava = session.player_for(sid(1)).unwrap();
		assert_eq!(ava.films[0].multiplier, Some(1.6));
		assert_eq!(ava.films[0].box_office, Some(160));
		assert_eq!(ava.films[0].performance, Some(Performance::Hit));
		assert_eq!(ava.films[1].box_office, None);
		assert_eq!(ava.score, 160);
		assert_eq!(ava.money, 100 + 80);

		// Already-released films are not scored twice.
		session.run_releases(Season::Winter);
		assert_eq!(session.player_for(sid(1)).unwrap().score, 160);
	}

	#[test]
	fn test_release_is_deterministic_for_seed() {
		let run = |seed| {
			let mut r = rules(seed);
			r.multiplier_jitter = 0.2;
			let mut session = session_with(r, &["Ava", "Ben"]);
			let id = id_of(&session, 1);
			if let Some(p) = session.players.get_mut(&id) {
				p.films.push(film(Season::Winter, 90));
			}
			session.run_releases(Season::Winter);
			session.player_for(sid(1)).unwrap().films[0].box_office
		};
		assert_eq!(run(21), run(21));
	}
}
