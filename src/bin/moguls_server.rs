use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use hollywood_moguls::config::{load_content_auto, load_moguls, load_moguls_auto};
use hollywood_moguls::defaults;
use hollywood_moguls::logging;
use hollywood_moguls::net::GameServer;
use hollywood_moguls::session::GameSession;

#[derive(Parser)]
#[command(name = "moguls-server")]
#[command(about = "Host a Hollywood Moguls game")]
struct Cli {
	/// Address to listen on. Overrides `[server] addr`.
	#[arg(short, long, env = "MOGULS_ADDR")]
	addr: Option<String>,

	/// Seed for a reproducible game.
	#[arg(short, long, env = "MOGULS_SEED")]
	seed: Option<u64>,

	#[arg(long, env = "MOGULS_LOG_DIR")]
	log_dir: Option<PathBuf>,

	#[arg(long, env = "MOGULS_LOG_LEVEL")]
	log_level: Option<String>,

	/// Explicit moguls.toml instead of the usual search.
	#[arg(short, long)]
	config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	defaults::ensure_config();

	let loaded = match &cli.config {
		Some(path) => load_moguls(path),
		None => load_moguls_auto(),
	};
	let mut config = match loaded {
		Ok(config) => config,
		Err(e) => {
			eprintln!("{}", e);
			std::process::exit(1);
		}
	};
	let content = match load_content_auto() {
		Ok(content) => content,
		Err(e) => {
			eprintln!("{}", e);
			std::process::exit(1);
		}
	};

	if let Some(addr) = cli.addr {
		config.server.addr = addr;
	}
	if let Some(dir) = cli.log_dir {
		config.server.log_dir = dir;
	}
	if let Some(level) = cli.log_level {
		config.server.log_level = level;
	}
	if cli.seed.is_some() {
		config.rules.seed = cli.seed;
	}

	let _log_guard = match logging::init(&config.server.log_dir, &config.server.log_level) {
		Ok(guard) => guard,
		Err(e) => {
			eprintln!("{}", e);
			std::process::exit(1);
		}
	};

	let game = GameSession::new(config.rules, content);
	let server = GameServer::new(game).with_tick(Duration::from_secs(config.server.tick_secs));

	if let Err(e) = server.run(&config.server.addr).await {
		tracing::error!(error = %e, "server error");
		std::process::exit(1);
	}
}
