use rand::Rng;
use rand::seq::IndexedRandom;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::content::ContentTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Producer,
	Screenwriter,
	Director,
	Star,
}

impl Role {
	pub const ALL: [Role; 4] = [Role::Producer, Role::Screenwriter, Role::Director, Role::Star];

	pub fn key(&self) -> &'static str {
		match self {
			Role::Producer => "producer",
			Role::Screenwriter => "screenwriter",
			Role::Director => "director",
			Role::Star => "star",
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Role::Producer => "Producer",
			Role::Screenwriter => "Screenwriter",
			Role::Director => "Director",
			Role::Star => "Star",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.label())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeatBucket {
	None,
	Unknown,
	Building,
	Buzzing,
	Superstar,
}

impl HeatBucket {
	pub fn of(heat: u32) -> Self {
		match heat {
			0 => HeatBucket::None,
			1..=63 => HeatBucket::Unknown,
			64..=127 => HeatBucket::Building,
			128..=191 => HeatBucket::Buzzing,
			_ => HeatBucket::Superstar,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrestigeBucket {
	None,
	Mainstream,
	Artist,
	Auteur,
}

impl PrestigeBucket {
	pub fn of(prestige: u32) -> Self {
		match prestige {
			0 => PrestigeBucket::None,
			1..=33 => PrestigeBucket::Mainstream,
			34..=66 => PrestigeBucket::Artist,
			_ => PrestigeBucket::Auteur,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TalentId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Talent {
	pub id: TalentId,
	pub name: String,
	pub role: Role,
	pub heat: u32,
	pub heat_bucket: HeatBucket,
	pub prestige: u32,
	pub prestige_bucket: PrestigeBucket,
	pub salary: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub genre: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub audience: Option<String>,
}

impl Talent {
	pub fn new(id: TalentId, name: impl Into<String>, role: Role, heat: u32, prestige: u32, salary: u32) -> Self {
		Self {
			id,
			name: name.into(),
			role,
			heat,
			heat_bucket: HeatBucket::of(heat),
			prestige,
			prestige_bucket: PrestigeBucket::of(prestige),
			salary,
			genre: None,
			audience: None,
		}
	}

	pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
		self.genre = Some(genre.into());
		self
	}

	pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
		self.audience = Some(audience.into());
		self
	}
}

/// Hands out talent ids for one session.
#[derive(Debug, Clone, Default)]
pub struct TalentIds {
	next: u32,
}

impl TalentIds {
	pub fn next_id(&mut self) -> TalentId {
		let id = TalentId(self.next);
		self.next += 1;
		id
	}
}

/// Stats for a player-named screenwriter, director or star.
pub fn generate_talent<R: Rng>(
	id: TalentId,
	role: Role,
	name: &str,
	content: &ContentTables,
	rng: &mut R,
) -> Talent {
	if role == Role::Producer {
		return generate_producer(id, name, content, rng);
	}

	let heat: u32 = rng.random_range(1..=255);
	let mut prestige: u32 = rng.random_range(1..=100);

	let salary = match role {
		Role::Screenwriter => prestige / 10 + rng.random_range(1..=3),
		Role::Director => {
			let swing: i64 = rng.random_range(-10..=10);
			prestige = (100 - (heat / 3) as i64 + swing).clamp(1, 100) as u32;
			heat / 10 + rng.random_range(1..=5)
		}
		_ => heat / 10 + rng.random_range(1..=5),
	};

	let talent = Talent::new(id, name, role, heat, prestige, salary);
	if role == Role::Screenwriter {
		match content.audiences.choose(rng) {
			Some(audience) => talent.with_audience(audience.clone()),
			None => talent,
		}
	} else {
		talent
	}
}

/// Most producers are cheap and bring nothing but a genre; a few bring heat or prestige.
pub fn generate_producer<R: Rng>(id: TalentId, name: &str, content: &ContentTables, rng: &mut R) -> Talent {
	let (heat, prestige, salary) = if rng.random_bool(0.7) {
		(0, 0, rng.random_range(1..=3))
	} else if rng.random_bool(0.5) {
		(rng.random_range(50..=100), 0, rng.random_range(8..=15))
	} else {
		(0, rng.random_range(50..=80), rng.random_range(8..=15))
	};

	let talent = Talent::new(id, name, Role::Producer, heat, prestige, salary);
	match content.genres.choose(rng) {
		Some(genre) => talent.with_genre(genre.clone()),
		None => talent,
	}
}

pub fn random_producer<R: Rng>(id: TalentId, content: &ContentTables, rng: &mut R) -> Talent {
	let name = content
		.producer_names
		.choose(rng)
		.cloned()
		.unwrap_or_else(|| "Studio Producer".to_string());
	generate_producer(id, &name, content, rng)
}

/// Renames repeats in place: `X`, `X Jr.`, `X II` .. `X V`, then `X #n`.
pub fn disambiguate_names(talent: &mut [Talent]) {
	const SUFFIXES: [&str; 4] = ["II", "III", "IV", "V"];
	let mut seen: HashMap<String, usize> = HashMap::new();

	for t in talent.iter_mut() {
		let count = seen.entry(t.name.clone()).or_insert(0);
		*count += 1;
		match *count {
			1 => {}
			2 => t.name = format!("{} Jr.", t.name),
			n if n - 3 < SUFFIXES.len() => t.name = format!("{} {}", t.name, SUFFIXES[n - 3]),
			n => t.name = format!("{} #{}", t.name, n),
		}
	}
}

/// The fixed budget roster. Serialises as an ordered `role -> talent` map,
/// which is how clients derive the `-(k+1)` role index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoNameRoster {
	entries: Vec<Talent>,
}

impl NoNameRoster {
	pub fn from_content(content: &ContentTables, ids: &mut TalentIds) -> Self {
		let entries = content
			.no_name
			.iter()
			.map(|entry| {
				let mut talent = Talent::new(
					ids.next_id(),
					entry.name.clone(),
					entry.role,
					entry.heat,
					entry.prestige,
					entry.salary,
				);
				talent.genre = entry.genre.clone();
				talent.audience = entry.audience.clone();
				talent
			})
			.collect();
		Self { entries }
	}

	pub fn get(&self, index: usize) -> Option<&Talent> {
		self.entries.get(index)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Talent> {
		self.entries.iter()
	}

	fn keys(&self) -> Vec<String> {
		let mut seen: HashMap<Role, usize> = HashMap::new();
		self.entries
			.iter()
			.map(|t| {
				let n = seen.entry(t.role).or_insert(0);
				*n += 1;
				if *n == 1 {
					t.role.key().to_string()
				} else {
					format!("{}_{}", t.role.key(), n)
				}
			})
			.collect()
	}
}

impl Serialize for NoNameRoster {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.entries.len()))?;
		for (key, talent) in self.keys().iter().zip(&self.entries) {
			map.serialize_entry(key, talent)?;
		}
		map.end()
	}
}

impl<'de> Deserialize<'de> for NoNameRoster {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct RosterVisitor;

		impl<'de> Visitor<'de> for RosterVisitor {
			type Value = NoNameRoster;

			fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
				f.write_str("a map of role to talent")
			}

			fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
				let mut entries = Vec::new();
				while let Some((_, talent)) = access.next_entry::<String, Talent>()? {
					entries.push(talent);
				}
				Ok(NoNameRoster { entries })
			}
		}

		deserializer.deserialize_map(RosterVisitor)
	}
}

/// A role inside a package: an owned role by inventory index, or a no-name
/// talent. On the wire `-(k+1)` means the k-th no-name entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleRef {
	Owned(usize),
	NoName(usize),
}

impl RoleRef {
	pub fn from_index(index: i64) -> Self {
		if index >= 0 {
			RoleRef::Owned(index as usize)
		} else {
			RoleRef::NoName((-(index + 1)) as usize)
		}
	}

	pub fn to_index(self) -> i64 {
		match self {
			RoleRef::Owned(i) => i as i64,
			RoleRef::NoName(k) => -(k as i64) - 1,
		}
	}
}
