use include_dir::{include_dir, Dir};
use std::fs;
use std::path::Path;

static CONFIG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/config");

/// Copies the shipped config files into the user config dir, never overwriting.
pub fn ensure_config() {
	let Some(user_config) = dirs::config_dir() else {
		return;
	};
	let dest = user_config.join("hollywood-moguls");

	extract_dir(&CONFIG_DIR, &dest);
}

fn extract_dir(dir: &Dir, dest: &Path) {
	for file in dir.files() {
		let file_dest = dest.join(file.path());
		if !file_dest.exists() {
			if let Some(parent) = file_dest.parent() {
				let _ = fs::create_dir_all(parent);
			}
			if let Err(e) = fs::write(&file_dest, file.contents()) {
				tracing::warn!(path = %file_dest.display(), error = %e, "could not write default config");
			}
		}
	}

	for subdir in dir.dirs() {
		extract_dir(subdir, dest);
	}
}

pub fn builtin_file(name: &str) -> Option<&'static str> {
	CONFIG_DIR.get_file(name).and_then(|f| f.contents_utf8())
}
