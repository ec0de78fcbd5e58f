use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::defaults;
use crate::talent::Role;

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultNames {
	#[serde(default)]
	pub screenwriter: Vec<String>,
	#[serde(default)]
	pub director: Vec<String>,
	#[serde(default)]
	pub star: Vec<String>,
}

/// One entry of the always-available budget roster.
#[derive(Debug, Clone, Deserialize)]
pub struct NoNameEntry {
	pub role: Role,
	pub name: String,
	#[serde(default)]
	pub heat: u32,
	#[serde(default)]
	pub prestige: u32,
	#[serde(default)]
	pub salary: u32,
	#[serde(default)]
	pub genre: Option<String>,
	#[serde(default)]
	pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiplierRule {
	pub genre: String,
	pub audience: String,
	pub value: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Eligibility {
	#[default]
	Any,
	Genre {
		genre: String,
	},
	Audience {
		audience: String,
	},
}

impl Eligibility {
	pub fn admits(&self, genre: &str, audience: &str) -> bool {
		match self {
			Eligibility::Any => true,
			Eligibility::Genre { genre: g } => g.eq_ignore_ascii_case(genre),
			Eligibility::Audience { audience: a } => a.eq_ignore_ascii_case(audience),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct AwardCategoryConfig {
	pub key: String,
	pub name: String,
	pub points_value: u32,
	#[serde(default)]
	pub eligibility: Eligibility,
}

/// Name lists, the genre/audience market table and award categories.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentTables {
	pub genres: Vec<String>,
	pub audiences: Vec<String>,
	pub default_names: DefaultNames,
	pub producer_names: Vec<String>,
	pub no_name: Vec<NoNameEntry>,
	#[serde(default = "default_multiplier")]
	pub default_multiplier: f32,
	#[serde(default)]
	pub multipliers: Vec<MultiplierRule>,
	#[serde(default)]
	pub award_categories: Vec<AwardCategoryConfig>,
}

fn default_multiplier() -> f32 {
	1.0
}

impl ContentTables {
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
		let content = fs::read_to_string(&path)
			.map_err(|e| format!("Failed to read {}: {}", path.as_ref().display(), e))?;
		Self::parse(&content)
	}

	/// The tables shipped inside the binary.
	pub fn builtin() -> Result<Self, String> {
		let content = defaults::builtin_file("content.toml")
			.ok_or_else(|| "Built-in content.toml is missing".to_string())?;
		Self::parse(content)
	}

	pub fn parse(content: &str) -> Result<Self, String> {
		let tables: Self = toml::from_str(content)
			.map_err(|e| format!("Failed to parse content tables: {}", e))?;
		tables.validate()?;
		Ok(tables)
	}

	fn validate(&self) -> Result<(), String> {
		if self.genres.is_empty() {
			return Err("content tables need at least one genre".to_string());
		}
		if self.audiences.is_empty() {
			return Err("content tables need at least one audience".to_string());
		}
		if self.producer_names.is_empty() {
			return Err("content tables need at least one producer name".to_string());
		}
		for role in Role::ALL {
			if !self.no_name.iter().any(|n| n.role == role) {
				return Err(format!("no-name roster has no {}", role.label()));
			}
		}
		Ok(())
	}

	pub fn default_name(&self, role: Role, index: usize) -> Option<&str> {
		let names = match role {
			Role::Screenwriter => &self.default_names.screenwriter,
			Role::Director => &self.default_names.director,
			Role::Star => &self.default_names.star,
			Role::Producer => &self.producer_names,
		};
		names.get(index).map(String::as_str)
	}

	pub fn base_multiplier(&self, genre: &str, audience: &str) -> f32 {
		self.multipliers
			.iter()
			.find(|m| m.genre.eq_ignore_ascii_case(genre) && m.audience.eq_ignore_ascii_case(audience))
			.map(|m| m.value)
			.unwrap_or(self.default_multiplier)
	}
}
