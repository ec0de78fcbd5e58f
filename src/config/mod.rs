use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "hollywood-moguls";

fn config_paths(filename: &str) -> Vec<PathBuf> {
	let mut paths = Vec::new();

	if let Some(config_dir) = dirs::config_dir() {
		paths.push(config_dir.join(APP_DIR).join(filename));
	}

	paths.push(PathBuf::from("config").join(filename));

	paths
}

fn find_config(filename: &str) -> Option<PathBuf> {
	config_paths(filename).into_iter().find(|p| p.exists())
}

pub fn resolve_config(filename: &str) -> Result<PathBuf, String> {
	find_config(filename).ok_or_else(|| {
		let searched: Vec<_> = config_paths(filename)
			.iter()
			.map(|p| p.display().to_string())
			.collect();
		format!("Config file '{}' not found. Searched: {}", filename, searched.join(", "))
	})
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
	pub addr: String,
	pub log_dir: PathBuf,
	pub log_level: String,
	/// Seconds between liveness sweeps of disconnected players.
	pub tick_secs: u64,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			addr: "0.0.0.0:8080".to_string(),
			log_dir: PathBuf::from("logs"),
			log_level: "info".to_string(),
			tick_secs: 1,
		}
	}
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NamingQuota {
	pub screenwriter: usize,
	pub director: usize,
	pub star: usize,
}

impl Default for NamingQuota {
	fn default() -> Self {
		Self {
			screenwriter: 3,
			director: 3,
			star: 5,
		}
	}
}

impl NamingQuota {
	pub fn total(&self) -> usize {
		self.screenwriter + self.director + self.star
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameRules {
	pub starting_money: u32,
	pub min_players: usize,
	pub turns_per_season: u32,
	pub naming: NamingQuota,
	/// Share of salary refunded for roles released at the end of packaging, capped at 100.
	pub release_refund_percent: u32,
	/// Share of box office paid back to the studio as spendable money, capped at 100.
	pub revenue_share_percent: u32,
	pub multiplier_jitter: f32,
	pub nominees_per_category: usize,
	/// `None` or 0 keeps disconnected players' slots open forever.
	pub disconnect_grace_secs: Option<u64>,
	pub seed: Option<u64>,
}

impl Default for GameRules {
	fn default() -> Self {
		Self {
			starting_money: 100,
			min_players: 2,
			turns_per_season: 5,
			naming: NamingQuota::default(),
			release_refund_percent: 0,
			revenue_share_percent: 50,
			multiplier_jitter: 0.2,
			nominees_per_category: 5,
			disconnect_grace_secs: Some(90),
			seed: None,
		}
	}
}

impl GameRules {
	pub fn disconnect_grace(&self) -> Option<chrono::Duration> {
		match self.disconnect_grace_secs {
			Some(0) | None => None,
			Some(secs) => Some(chrono::Duration::seconds(secs as i64)),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MogulsConfig {
	pub server: ServerConfig,
	pub rules: GameRules,
}

pub fn load_moguls<P: AsRef<Path>>(path: P) -> Result<MogulsConfig, String> {
	let content = fs::read_to_string(&path)
		.map_err(|e| format!("Failed to read {}: {}", path.as_ref().display(), e))?;

	toml::from_str(&content)
		.map_err(|e| format!("Failed to parse moguls config: {}", e))
}

/// Falls back to built-in defaults when no `moguls.toml` is found.
pub fn load_moguls_auto() -> Result<MogulsConfig, String> {
	match resolve_config("moguls.toml") {
		Ok(path) => load_moguls(&path),
		Err(_) => Ok(MogulsConfig::default()),
	}
}

pub fn load_content_auto() -> Result<crate::content::ContentTables, String> {
	match resolve_config("content.toml") {
		Ok(path) => crate::content::ContentTables::load(&path),
		Err(_) => crate::content::ContentTables::builtin(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_rules_defaults() {
		let rules = GameRules::default();
		assert_eq!(rules.starting_money, 100);
		assert_eq!(rules.turns_per_season, 5);
		assert_eq!(rules.naming.total(), 11);
		assert_eq!(rules.release_refund_percent, 0);
	}

	#[test]
	fn test_disconnect_grace_zero_disables() {
		let mut rules = GameRules::default();
		rules.disconnect_grace_secs = Some(0);
		assert!(rules.disconnect_grace().is_none());
		rules.disconnect_grace_secs = Some(30);
		assert_eq!(rules.disconnect_grace(), Some(chrono::Duration::seconds(30)));
	}

	#[test]
	fn test_partial_file_keeps_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[rules]\nstarting_money = 250\nseed = 7\n\n[rules.naming]\nstar = 2").unwrap();

		let config = load_moguls(file.path()).unwrap();
		assert_eq!(config.rules.starting_money, 250);
		assert_eq!(config.rules.seed, Some(7));
		assert_eq!(config.rules.naming.star, 2);
		assert_eq!(config.rules.naming.screenwriter, 3);
		assert_eq!(config.rules.turns_per_season, 5);
		assert_eq!(config.server.addr, "0.0.0.0:8080");
	}

	#[test]
	fn test_load_missing_file_reports_path() {
		let err = load_moguls("/definitely/not/here.toml").unwrap_err();
		assert!(err.contains("/definitely/not/here.toml"));
	}

	#[test]
	fn test_bad_toml_is_reported() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[rules]\nstarting_money = \"lots\"").unwrap();
		let err = load_moguls(file.path()).unwrap_err();
		assert!(err.starts_with("Failed to parse moguls config"));
	}
}
