use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};
use crate::logging;
use crate::session::player::percent_of;
use crate::session::{Checkpoint, GameSession, Performance, Phase, Player, PlayerId, Season, SessionId};
use crate::talent::{Role, RoleRef, Talent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
	pub title: String,
	pub teaser: String,
	pub roles: Vec<Talent>,
	pub heat: u32,
	pub prestige: u32,
	pub genre: String,
	pub audience: String,
	pub studio: String,
	pub season: Season,
	/// Greenlight sequence number across the whole game.
	pub order: u64,
	#[serde(default)]
	pub multiplier: Option<f32>,
	#[serde(default)]
	pub box_office: Option<u32>,
	#[serde(default)]
	pub performance: Option<Performance>,
}

impl Film {
	pub fn from_roles(
		title: &str,
		teaser: &str,
		roles: Vec<Talent>,
		studio: &str,
		season: Season,
		order: u64,
	) -> Self {
		let heat = roles.iter().map(|r| r.heat).sum();
		let prestige = match roles.len() {
			0 => 0,
			n => roles.iter().map(|r| r.prestige).sum::<u32>() / n as u32,
		};
		let genre = trait_of(&roles, Role::Producer, |t| t.genre.clone());
		let audience = trait_of(&roles, Role::Screenwriter, |t| t.audience.clone());
		let teaser = match teaser.trim() {
			"" => format!("A {} film for {}", genre, audience),
			given => given.to_string(),
		};

		Self {
			title: title.trim().to_string(),
			teaser,
			roles,
			heat,
			prestige,
			genre,
			audience,
			studio: studio.to_string(),
			season,
			order,
			multiplier: None,
			box_office: None,
			performance: None,
		}
	}
}

fn trait_of(roles: &[Talent], role: Role, pick: impl Fn(&Talent) -> Option<String>) -> String {
	roles
		.iter()
		.filter(|t| t.role == role)
		.find_map(pick)
		.unwrap_or_else(|| "Unknown".to_string())
}

/// Role types a package still lacks.
pub fn missing_roles(roles: impl IntoIterator<Item = Role> + Clone) -> Vec<Role> {
	Role::ALL
		.into_iter()
		.filter(|needed| !roles.clone().into_iter().any(|r| r == *needed))
		.collect()
}

/// One producer, one screenwriter, one director and at least one star.
pub fn validate_package(roles: &[Talent]) -> GameResult<()> {
	let missing = missing_roles(roles.iter().map(|t| t.role));
	if !missing.is_empty() {
		return Err(GameError::IncompletePackage { missing });
	}
	for role in [Role::Producer, Role::Screenwriter, Role::Director] {
		if roles.iter().filter(|t| t.role == role).count() > 1 {
			return Err(GameError::DuplicateRole { role });
		}
	}
	Ok(())
}

impl GameSession {
	fn packaging_season(&self, action: &'static str) -> GameResult<Season> {
		match self.phase {
			Phase::Packaging(season) => Ok(season),
			_ => Err(GameError::InvalidPhaseAction {
				action,
				phase: self.phase.tag(),
			}),
		}
	}

	/// A packager that has not finished yet.
	fn packager(&self, session: SessionId, season: Season) -> GameResult<PlayerId> {
		let id = self.player_id(session)?;
		if self.readiness.is_marked(Checkpoint::PackagingDone(season), id) {
			return Err(GameError::AlreadyFinished);
		}
		Ok(id)
	}

	pub(crate) fn resolve_role(&self, player: &Player, role_ref: RoleRef) -> Option<Talent> {
		match role_ref {
			RoleRef::Owned(index) => player.roles.get(index).cloned(),
			RoleRef::NoName(index) => self.no_name.get(index).cloned(),
		}
	}

	/// Stages or unstages a role in the player's draft package.
	pub fn toggle_role(&mut self, session: SessionId, index: i64) -> GameResult<()> {
		let season = self.packaging_season("toggle_role")?;
		let id = self.packager(session, season)?;
		let role_ref = RoleRef::from_index(index);
		if self.resolve_role(self.player(id)?, role_ref).is_none() {
			return Err(GameError::InvalidRoleRef { index });
		}

		if let Some(player) = self.players.get_mut(&id) {
			match player.draft_package.iter().position(|r| *r == role_ref) {
				Some(pos) => {
					player.draft_package.remove(pos);
				}
				None => player.draft_package.push(role_ref),
			}
		}
		Ok(())
	}

	pub fn greenlight(
		&mut self,
		session: SessionId,
		role_indices: &[i64],
		title: &str,
		teaser: &str,
	) -> GameResult<()> {
		let season = self.packaging_season("greenlight_film")?;
		let id = self.packager(session, season)?;
		if title.trim().is_empty() {
			return Err(GameError::MissingTitle);
		}

		let player = self.player(id)?;
		let mut refs: Vec<RoleRef> = Vec::with_capacity(role_indices.len());
		let mut roles = Vec::with_capacity(role_indices.len());
		for &index in role_indices {
			let role_ref = RoleRef::from_index(index);
			if refs.contains(&role_ref) {
				return Err(GameError::InvalidRoleRef { index });
			}
			let talent = self
				.resolve_role(player, role_ref)
				.ok_or(GameError::InvalidRoleRef { index })?;
			refs.push(role_ref);
			roles.push(talent);
		}
		validate_package(&roles)?;
		let studio = player.name.clone();

		self.greenlit += 1;
		let film = Film::from_roles(title, teaser, roles, &studio, season, self.greenlit);
		logging::packaging::greenlit(&studio, &film.title, film.heat, film.prestige);

		let mut owned: Vec<usize> = refs
			.iter()
			.filter_map(|r| match r {
				RoleRef::Owned(index) => Some(*index),
				RoleRef::NoName(_) => None,
			})
			.collect();
		owned.sort_unstable_by(|a, b| b.cmp(a));

		if let Some(player) = self.players.get_mut(&id) {
			for index in owned {
				player.roles.remove(index);
			}
			player.draft_package.clear();
			player.films.push(film);
		}
		Ok(())
	}

	/// Marks the player done for the season; unused roles are released.
	pub fn finish_packaging(&mut self, session: SessionId) -> GameResult<()> {
		let season = self.packaging_season("finish_packaging")?;
		let id = self.packager(session, season)?;
		let percent = self.rules.release_refund_percent;

		if let Some(player) = self.players.get_mut(&id) {
			if !player.roles.is_empty() {
				let salaries = player.roles.iter().fold(0u32, |sum, r| sum.saturating_add(r.salary));
				let refund = percent_of(salaries, percent);
				player.credit(refund);
				logging::packaging::released_roles(&player.name, player.roles.len(), refund);
				player.roles.clear();
			}
			player.draft_package.clear();
		}

		let checkpoint = Checkpoint::PackagingDone(season);
		if self.readiness.mark(checkpoint, id) {
			self.log_ready(id, checkpoint);
		}
		self.settle();
		Ok(())
	}

	pub(super) fn try_release(&mut self, season: Season) -> bool {
		if !self.all_ready(Checkpoint::PackagingDone(season)) {
			return false;
		}
		self.enter(Phase::Releases(season));
		self.run_releases(season);
		true
	}
}
