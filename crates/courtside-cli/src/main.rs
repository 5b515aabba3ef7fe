//! Courtside - command-line client for the Courtside fantasy basketball backend.
//!
//! Sign in, browse players and fixtures, manage leagues, and build a
//! fantasy squad from a JSON description.

mod app;
mod commands;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use courtside_core::Config;

use app::App;

/// Log file name inside the cache directory
const LOG_FILE: &str = "courtside.log";

/// Game week shown by `fixtures` when none is given
const DEFAULT_GAME_WEEK: u32 = 1;

const USAGE: &str = "\
Usage: courtside <command> [args]

Commands:
  login [USERNAME]        Sign in (password from keychain or prompt)
  register                Create an account
  logout                  Sign out and forget the saved password
  whoami                  Show the signed-in user
  players [--team ID]     List players, optionally for one team
  teams                   List teams
  fixtures [GAMEWEEK]     Show a game week's fixtures
  my-team                 Show your fantasy team
  create-team NAME        Create an empty fantasy team
  lineup GAMEWEEK         Submit your current lineup for a game week
  leagues                 List your leagues
  league ID               Show a league's standings
  create-league NAME      Create a league
  join-league CODE        Join a league with its code
  build-squad FILE        Build your fantasy squad from a JSON file

Set RUST_LOG to control logging (default: warn).";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file in the cache directory so they never mix with command
/// output; stderr is used if the directory cannot be created. The returned
/// guard must be held until exit to flush the file writer.
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
        return None;
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Some(guard)
}

fn required_arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("Missing {}\n\n{}", name, USAGE))
}

fn parse_id(value: &str, name: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("{} must be a number, got {:?}", name, value))
}

fn parse_game_week(value: &str) -> Result<u32> {
    value
        .parse()
        .with_context(|| format!("Game week must be a number, got {:?}", value))
}

async fn run(args: &[String]) -> Result<()> {
    let Some(command) = args.get(1).map(String::as_str) else {
        println!("{}", USAGE);
        return Ok(());
    };

    if matches!(command, "-h" | "--help" | "help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut app = App::new().await?;

    match command {
        "login" => commands::login(&mut app, args.get(2).cloned()).await,
        "register" => commands::register(&mut app).await,
        "logout" => commands::logout(&mut app).await,
        "whoami" => commands::whoami(&mut app).await,
        "players" => {
            let team_id = match args.get(2).map(String::as_str) {
                Some("--team") => Some(parse_id(required_arg(args, 3, "team id")?, "Team id")?),
                Some(other) => anyhow::bail!("Unknown option {:?}\n\n{}", other, USAGE),
                None => None,
            };
            commands::players(&app, team_id).await
        }
        "teams" => commands::teams(&app).await,
        "fixtures" => {
            let game_week = match args.get(2) {
                Some(value) => parse_game_week(value)?,
                None => DEFAULT_GAME_WEEK,
            };
            commands::fixtures(&app, game_week).await
        }
        "my-team" => commands::my_team(&app).await,
        "create-team" => {
            let name = args[2..].join(" ");
            if name.trim().is_empty() {
                anyhow::bail!("Missing team name\n\n{}", USAGE);
            }
            commands::create_team(&mut app, name.trim()).await
        }
        "lineup" => {
            let game_week = parse_game_week(required_arg(args, 2, "game week")?)?;
            commands::lineup(&app, game_week).await
        }
        "leagues" => commands::leagues(&app).await,
        "league" => {
            let league_id = parse_id(required_arg(args, 2, "league id")?, "League id")?;
            commands::league(&app, league_id).await
        }
        "create-league" => {
            let name = args[2..].join(" ");
            if name.trim().is_empty() {
                anyhow::bail!("Missing league name\n\n{}", USAGE);
            }
            commands::create_league(&app, name.trim()).await
        }
        "join-league" => {
            let code = required_arg(args, 2, "join code")?;
            commands::join_league(&app, code).await
        }
        "build-squad" => {
            let path = PathBuf::from(required_arg(args, 2, "squad file")?);
            commands::build_squad(&mut app, &path).await
        }
        other => anyhow::bail!("Unknown command {:?}\n\n{}", other, USAGE),
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_dir = Config::load()
        .and_then(|config| config.cache_dir())
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    let guard = init_tracing(&log_dir);
    info!("Courtside starting");

    let args: Vec<String> = std::env::args().collect();
    let result = run(&args).await;

    // Flush the log file before a possible exit
    drop(guard);
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
