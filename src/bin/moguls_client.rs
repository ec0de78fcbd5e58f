use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;

use hollywood_moguls::net::{GameClient, ServerMessage};
use hollywood_moguls::session::GameSnapshot;

#[derive(Parser)]
#[command(name = "moguls-client")]
#[command(about = "Line-mode client for a Hollywood Moguls server")]
struct Cli {
	#[arg(short, long, default_value = "127.0.0.1:8080", env = "MOGULS_ADDR")]
	addr: String,

	#[arg(short, long)]
	name: Option<String>,
}

fn print_help() {
	println!("Commands:");
	println!("  start             - Open naming (lobby) or start production");
	println!("  name <text>       - Name your next talent (blank for default)");
	println!("  pick <n> | pass   - Select a card this turn");
	println!("  bid <amount>      - Sealed bid in the current war");
	println!("  toggle <i>        - Stage a role (negative for no-name talent)");
	println!("  greenlight <i,j,k,l> <title>");
	println!("  finish            - Done packaging this season");
	println!("  vote <n>          - Vote for a nominee");
	println!("  ok                - Acknowledge results and move on");
	println!("  update            - Ask for a fresh snapshot");
	println!("  quit, q           - Disconnect");
}

fn summarise(snapshot: &GameSnapshot) {
	println!(
		"[{}] year {} turn {} | {} cards on the table",
		snapshot.phase.tag(),
		snapshot.year,
		snapshot.turn,
		snapshot.current_turn_cards.len()
	);
	for (session, player) in &snapshot.players {
		let state = if player.timed_out {
			" (timed out)"
		} else if !player.connected {
			" (away)"
		} else {
			""
		};
		println!(
			"  {} {}: ${}M, score {}, {} roles, {} films{}",
			session,
			player.name,
			player.money,
			player.score,
			player.roles.len(),
			player.films.len(),
			state
		);
	}
	for (i, card) in snapshot.current_turn_cards.iter().enumerate() {
		println!("  card {}: {} ({}) heat {} salary ${}M", i, card.name, card.role, card.heat, card.salary);
	}
}

fn show(msg: ServerMessage) {
	match msg {
		ServerMessage::Joined => println!("< joined"),
		ServerMessage::GameUpdate { snapshot } => summarise(&snapshot),
		ServerMessage::SelectionError { message }
		| ServerMessage::BidError { message }
		| ServerMessage::PackageError { message }
		| ServerMessage::VoteError { message }
		| ServerMessage::Error { message } => println!("! {}", message),
	}
}

fn main() -> io::Result<()> {
	let cli = Cli::parse();
	println!("Connecting to {}...", cli.addr);

	let mut client = GameClient::connect(&cli.addr)?;
	println!("Connected!");

	let name = match cli.name {
		Some(name) => name,
		None => {
			print!("Studio name: ");
			io::stdout().flush()?;
			let mut name = String::new();
			io::stdin().read_line(&mut name)?;
			name.trim().to_string()
		}
	};
	client.join_game(&name)?;

	// Whether the last snapshot was in the lobby decides what `start` means.
	let mut phase = String::from("lobby");

	loop {
		std::thread::sleep(Duration::from_millis(100));
		while let Some(msg) = client.try_recv() {
			if let ServerMessage::GameUpdate { snapshot } = &msg {
				phase = snapshot.phase.tag().to_string();
			}
			show(msg);
		}

		print!("> ");
		io::stdout().flush()?;

		let mut input = String::new();
		if io::stdin().read_line(&mut input)? == 0 {
			break;
		}
		let input = input.trim();
		let (cmd, rest) = input.split_once(' ').unwrap_or((input, ""));
		let rest = rest.trim();

		match cmd {
			"start" if phase == "lobby" => client.start_naming()?,
			"start" => client.start_production()?,
			"name" => client.submit_talent_name(rest)?,
			"pass" => client.pass()?,
			"pick" => match rest.parse() {
				Ok(index) => client.select_card(index)?,
				Err(_) => println!("Usage: pick <n>"),
			},
			"bid" => match rest.parse() {
				Ok(amount) => client.submit_bid(amount)?,
				Err(_) => println!("Usage: bid <amount>"),
			},
			"toggle" => match rest.parse() {
				Ok(index) => client.toggle_role(index)?,
				Err(_) => println!("Usage: toggle <i>"),
			},
			"greenlight" => {
				let (indices, title) = rest.split_once(' ').unwrap_or((rest, ""));
				let parsed: Result<Vec<i64>, _> = indices.split(',').map(|i| i.trim().parse()).collect();
				match parsed {
					Ok(indices) => client.greenlight(&indices, title.trim(), "")?,
					Err(_) => println!("Usage: greenlight <i,j,k,l> <title>"),
				}
			}
			"finish" => client.finish_packaging()?,
			"vote" => match rest.parse() {
				Ok(index) => client.vote(index)?,
				Err(_) => println!("Usage: vote <n>"),
			},
			"ok" => match phase.as_str() {
				"phase1_releases" => client.continue_to_summer()?,
				"phase2_releases" => client.start_awards()?,
				"awards_results" => client.continue_from_awards()?,
				_ => client.continue_after_bidding()?,
			},
			"update" => client.request_update()?,
			"quit" | "q" => break,
			"help" | "h" | "?" => print_help(),
			"" => client.heartbeat(Some(name.as_str()))?,
			_ => println!("Unknown command. Type 'help' for commands."),
		}
	}

	println!("Disconnected.");
	Ok(())
}
