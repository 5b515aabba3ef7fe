//! One function per CLI command. Output goes to stdout; diagnostics go
//! through `tracing`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use courtside_core::models::{
    gameweek_start_date, FantasyTeam, LineupRequest, Player, PlayerQuery, Position,
    RegisterRequest, SquadEntry, UserPatch,
};
use courtside_core::squad::{submit_for_session, RoleChange, SlotRef, BENCH_SIZE};
use courtside_core::utils::{format_ownership, format_points, format_price, truncate_string};
use courtside_core::{CredentialStore, FantasyBackend, SquadDraft, SquadError};

use crate::app::{prompt_line, prompt_password, App};

/// Column width for player names in listings
const NAME_WIDTH: usize = 24;

/// Page size used when loading every player for squad building
const ALL_PLAYERS_PAGE_SIZE: u32 = 1000;

pub async fn login(app: &mut App, username: Option<String>) -> Result<()> {
    let user = app.login(username).await?;
    println!("Signed in as {}", user.display_name());

    // The login response's flag can lag behind; ask the backend directly
    let has_team = match app.client().has_fantasy_team(user.id).await {
        Ok(has_team) => {
            if has_team != user.has_fantasy_team {
                if let Err(e) = app
                    .session
                    .update_user(&UserPatch::has_fantasy_team(has_team))
                    .await
                {
                    warn!(error = %e, "Failed to persist fantasy team flag");
                }
            }
            has_team
        }
        Err(e) => {
            warn!(error = %e, "Could not check for a fantasy team");
            user.has_fantasy_team
        }
    };
    if !has_team {
        println!("You have not built a fantasy team yet. Try `courtside build-squad FILE`.");
    }
    Ok(())
}

pub async fn register(app: &mut App) -> Result<()> {
    let username = prompt_line("Username")?;
    let email = prompt_line("Email")?;
    let password = prompt_password()?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    let client = app.client();
    let teams = client
        .teams()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not load teams")))?;
    for team in &teams {
        println!("  {:>4}  {}", team.id, team.name);
    }
    let favourite_team_id: i64 = prompt_line("Favourite team id")?
        .parse()
        .context("Team id must be a number")?;
    let nationality = prompt_line("Nationality")?;

    let request = RegisterRequest {
        username: username.clone(),
        email,
        password,
        favourite_team_id,
        nationality,
    };
    debug!(?request, "Registering");
    let created = client
        .register(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Registration failed")))?;

    println!("Account created for {} (id {})", created.email, created.id);
    println!("Sign in with `courtside login {}`", username);
    Ok(())
}

pub async fn logout(app: &mut App) -> Result<()> {
    app.logout().await?;
    println!("Signed out");
    Ok(())
}

pub async fn whoami(app: &mut App) -> Result<()> {
    let cached = app.require_user()?;

    // Refresh from the backend when a token is available; fall back to the cache
    let client = app.client();
    if client.has_token() {
        match client.me().await {
            Ok(fresh) => {
                let patch = UserPatch {
                    username: Some(fresh.username),
                    email: Some(fresh.email),
                    role: fresh.role,
                    has_fantasy_team: Some(fresh.has_fantasy_team),
                };
                if let Err(e) = app.session.update_user(&patch).await {
                    warn!(error = %e, "Failed to persist refreshed user");
                }
            }
            Err(e) => warn!(error = %e, "Could not refresh user, showing cached data"),
        }
    }

    let user = app.session.user().cloned().unwrap_or(cached);
    println!("{} (id {})", user.display_name(), user.id);
    if !user.email.is_empty() {
        println!("Email:        {}", user.email);
    }
    if let Some(role) = &user.role {
        println!("Role:         {}", role);
    }
    println!(
        "Fantasy team: {}",
        if user.has_fantasy_team { "yes" } else { "no" }
    );
    if app.session.token().is_none() {
        println!("Token:        none (signed in without a bearer token)");
    } else if let Some(info) = app.session.token_info() {
        match (info.expires_at, info.minutes_until_expiry()) {
            (Some(expires_at), _) if info.is_expired() => {
                warn!(%expires_at, "Stored token has expired");
                println!(
                    "Token:        expired {} (run `courtside login`)",
                    expires_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
            (Some(expires_at), Some(minutes)) => println!(
                "Token:        expires {} ({} min left)",
                expires_at.format("%Y-%m-%d %H:%M UTC"),
                minutes
            ),
            _ => println!("Token:        no expiry claim"),
        }
    }
    if let Some(username) = &app.config.last_username {
        if CredentialStore::has_credentials(username) {
            println!("Password saved in keychain for {}", username);
        }
    }
    Ok(())
}

fn print_player_row(player: &Player) {
    println!(
        "{:>5}  {:<width$}  {:<2}  {:<18}  {:>8}  {:>6}",
        player.id,
        truncate_string(&player.full_name(), NAME_WIDTH),
        player.position.abbreviation(),
        truncate_string(&player.team.name, 18),
        format_price(player.price),
        format_ownership(player.ownership_pct),
        width = NAME_WIDTH,
    );
}

pub async fn players(app: &App, team_id: Option<i64>) -> Result<()> {
    let client = app.client();
    let players = match team_id {
        Some(id) => client.team_players(id).await,
        None => client.players(&PlayerQuery::default()).await,
    }
    .map_err(|e| anyhow::anyhow!(e.user_message("Could not load players")))?;

    for player in &players {
        print_player_row(player);
    }
    println!("{} players", players.len());
    Ok(())
}

pub async fn teams(app: &App) -> Result<()> {
    let teams = app
        .client()
        .teams()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not load teams")))?;

    for team in &teams {
        println!(
            "{:>4}  {:<6}  {:<24}  {}",
            team.id,
            team.label(),
            team.name,
            team.city.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn fixtures(app: &App, game_week: u32) -> Result<()> {
    let fixtures = app
        .client()
        .fixtures(game_week)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not load fixtures")))?;

    match gameweek_start_date(game_week) {
        Some(start) => println!("Game week {} (from {})", game_week, start.format("%a %d %b %Y")),
        None => println!("Game week {}", game_week),
    }
    if fixtures.is_empty() {
        println!("  No fixtures scheduled");
    }
    for fixture in &fixtures {
        println!("  {} vs {}", fixture.home_team, fixture.away_team);
    }
    Ok(())
}

fn role_marker(entry: &SquadEntry) -> &'static str {
    if entry.is_captain {
        " (C)"
    } else if entry.is_vice_captain {
        " (VC)"
    } else {
        ""
    }
}

fn print_team(team: &FantasyTeam) {
    println!("{}", team.team_name);
    println!(
        "Points: {}   Value: {}   Transfers left: {}",
        format_points(team.total_points),
        format_price(team.squad_value()),
        team.transfers_remaining
    );
    println!("Starting five:");
    for entry in team.starters() {
        let slot = entry.position.unwrap_or(entry.player.position);
        println!(
            "  {:<2}  {}{}",
            slot.abbreviation(),
            entry.player.full_name(),
            role_marker(entry)
        );
    }
    println!("Bench:");
    for entry in team.bench() {
        println!("      {}{}", entry.player.full_name(), role_marker(entry));
    }
}

pub async fn my_team(app: &App) -> Result<()> {
    let user = app.require_user()?;
    let team = app
        .client()
        .fetch_user_fantasy_team(user.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not load your team")))?;

    match team {
        Some(team) => print_team(&team),
        None => println!("You have not built a fantasy team yet."),
    }
    Ok(())
}

pub async fn create_team(app: &mut App, name: &str) -> Result<()> {
    let user = app.require_user()?;
    let team = app
        .client()
        .create_team(name, user.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not create your team")))?;

    if let Err(e) = app
        .session
        .update_user(&UserPatch::has_fantasy_team(true))
        .await
    {
        warn!(error = %e, "Failed to persist fantasy team flag");
    }
    println!("Created {}", team.team_name);
    Ok(())
}

/// Submit the saved team's current starters, bench and captain for a game week.
pub async fn lineup(app: &App, game_week: u32) -> Result<()> {
    let user = app.require_user()?;
    let client = app.client();
    let team = client
        .fetch_user_fantasy_team(user.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not load your team")))?
        .ok_or_else(|| anyhow::anyhow!("You have not built a fantasy team yet."))?;

    let request = LineupRequest::from_team(&team, i64::from(game_week))
        .ok_or_else(|| anyhow::anyhow!("Your team has not been saved yet"))?;
    let lineup = client
        .create_lineup(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not submit lineup")))?;

    println!("Lineup {} submitted for game week {}", lineup.id, game_week);
    Ok(())
}

pub async fn leagues(app: &App) -> Result<()> {
    let user = app.require_user()?;
    let leagues = app
        .client()
        .user_leagues(user.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not load leagues")))?;

    if leagues.is_empty() {
        println!("You are not in any leagues.");
    }
    for league in &leagues {
        println!(
            "{:>5}  {:<28}  rank {:<5}  {:>8} pts  joined {}",
            league.league_id,
            truncate_string(&league.league_name, 28),
            league.rank_display(),
            format_points(league.total_points),
            league.joined_display()
        );
    }
    Ok(())
}

pub async fn league(app: &App, league_id: i64) -> Result<()> {
    let details = app
        .client()
        .league_details(league_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not load league")))?;

    let name = details
        .league_name
        .clone()
        .unwrap_or_else(|| format!("League {}", details.league_id));
    println!("{}", name);
    for (i, standing) in details.rankings.iter().enumerate() {
        println!(
            "  {:>3}. {:<28}  {:>8}",
            i + 1,
            truncate_string(&standing.team_name, 28),
            format_points(standing.total_points)
        );
    }
    Ok(())
}

pub async fn create_league(app: &App, name: &str) -> Result<()> {
    let user = app.require_user()?;
    let league = app
        .client()
        .create_league(user.id, name)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not create league")))?;

    println!("Created league {} (id {})", league.name, league.id);
    if let Some(code) = league.join_code.as_deref().or(league.invite_code.as_deref()) {
        println!("Share this code to invite others: {}", code);
    }
    Ok(())
}

pub async fn join_league(app: &App, code: &str) -> Result<()> {
    let user = app.require_user()?;
    let message = app
        .client()
        .join_league(code, user.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not join league")))?;
    println!("{}", message);
    Ok(())
}

/// Squad description read by `build-squad`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SquadFile {
    team_name: String,
    /// Player ids in PG, SG, SF, PF, C order
    starters: Vec<i64>,
    bench: Vec<i64>,
    captain: Option<i64>,
    vice_captain: Option<i64>,
}

fn load_squad_file(path: &Path) -> Result<SquadFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse squad file {}", path.display()))
}

fn report_role(change: RoleChange, player_id: i64) {
    if let RoleChange::ConflictResolved { cleared } = change {
        println!("Note: player {} was {} and no longer is", player_id, cleared);
    }
}

/// Fill a draft from the squad file, looking players up by id.
fn draft_from_file(file: SquadFile, pool: &HashMap<i64, Player>) -> Result<SquadDraft> {
    if file.starters.len() > Position::ALL.len() {
        anyhow::bail!("At most {} starters allowed", Position::ALL.len());
    }
    if file.bench.len() > BENCH_SIZE {
        anyhow::bail!("At most {} bench players allowed", BENCH_SIZE);
    }

    let lookup = |id: i64| {
        pool.get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unknown player id {}", id))
    };

    let mut draft = SquadDraft::new();
    draft.set_team_name(file.team_name)?;

    let starting = Position::ALL.into_iter().map(SlotRef::Starting);
    let bench = (0..BENCH_SIZE).map(SlotRef::Bench);
    let picks = starting
        .zip(file.starters)
        .chain(bench.zip(file.bench));

    for (slot, id) in picks {
        let player = lookup(id)?;
        if draft.would_exceed_budget(&player) {
            println!(
                "Warning: adding {} ({}) takes the squad over budget",
                player.full_name(),
                format_price(player.price)
            );
        }
        draft.assign_player(slot, player)?;
    }

    if let Some(id) = file.captain {
        report_role(draft.set_captain(id)?, id);
    }
    if let Some(id) = file.vice_captain {
        report_role(draft.set_vice_captain(id)?, id);
    }
    Ok(draft)
}

pub async fn build_squad(app: &mut App, path: &Path) -> Result<()> {
    app.require_user()?;
    let file = load_squad_file(path)?;

    let client = app.client();
    let query = PlayerQuery {
        size: Some(ALL_PLAYERS_PAGE_SIZE),
        ..PlayerQuery::default()
    };
    let pool: HashMap<i64, Player> = client
        .players(&query)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Could not load players")))?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut draft = draft_from_file(file, &pool)?;
    println!(
        "Squad value {} ({} remaining)",
        format_price(draft.total_price()),
        format_price(draft.remaining_budget())
    );

    let issues = draft.validate_for_submit();
    if !issues.is_empty() {
        for issue in &issues {
            println!("{}: {}", issue.title(), issue);
        }
        anyhow::bail!("Squad is not ready to submit");
    }

    match submit_for_session(&mut draft, &client, &mut app.session).await {
        Ok(team) => {
            println!("Team created!");
            print_team(&team);
            Ok(())
        }
        Err(SquadError::BackendRejected(message)) => anyhow::bail!(message),
        Err(e) => Err(e.into()),
    }
}
