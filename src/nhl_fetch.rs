use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::edge::RosterEntry;
use crate::http_client::fetch_json_text;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledGame {
    pub id: u64,
    pub home: String,
    pub away: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterPlayer {
    pub name: String,
    pub position_code: String,
}

impl RosterPlayer {
    pub fn is_goalie(&self) -> bool {
        self.position_code.eq_ignore_ascii_case("G")
    }
}

#[derive(Debug, Clone, Default)]
pub struct SlateFeed {
    pub roster: Vec<RosterEntry>,
    pub goalie_gaa: HashMap<String, f64>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NhlApi {
    base: String,
}

impl NhlApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn schedule_url(&self, date: &str) -> String {
        format!("{}/v1/schedule/{date}", self.base)
    }

    pub fn roster_url(&self, team: &str) -> String {
        format!("{}/v1/roster/{}/current", self.base, team.to_ascii_uppercase())
    }

    pub fn club_stats_url(&self, team: &str) -> String {
        format!("{}/v1/club-stats/{}/now", self.base, team.to_ascii_uppercase())
    }

    pub fn fetch_schedule(&self, date: &str) -> Result<Vec<ScheduledGame>> {
        let body = fetch_json_text(&self.schedule_url(date)).context("schedule request failed")?;
        parse_schedule_json(&body, date)
    }

    pub fn fetch_roster(&self, team: &str) -> Result<Vec<RosterPlayer>> {
        let body = fetch_json_text(&self.roster_url(team)).context("roster request failed")?;
        parse_roster_json(&body)
    }

    pub fn fetch_goalie_gaa(&self, team: &str) -> Result<Option<f64>> {
        let body =
            fetch_json_text(&self.club_stats_url(team)).context("club stats request failed")?;
        parse_club_goalie_gaa(&body)
    }

    pub fn fetch_slate(&self, date: &str) -> Result<SlateFeed> {
        let games = self.fetch_schedule(date)?;
        let mut errors = Vec::new();
        let mut rosters: HashMap<String, Vec<RosterPlayer>> = HashMap::new();
        let mut goalie_gaa = HashMap::new();

        for team in teams_in_games(&games) {
            match self.fetch_roster(&team) {
                Ok(players) => {
                    rosters.insert(team.clone(), players);
                }
                Err(err) => {
                    warn!(team = %team, error = %err, "roster unavailable");
                    errors.push(format!("roster {team}: {err:#}"));
                }
            }
            match self.fetch_goalie_gaa(&team) {
                Ok(Some(gaa)) => {
                    goalie_gaa.insert(team.clone(), gaa);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(team = %team, error = %err, "goalie stats unavailable");
                    errors.push(format!("goalies {team}: {err:#}"));
                }
            }
        }

        let roster = roster_entries_for_games(&games, &rosters);
        info!(
            date,
            games = games.len(),
            skaters = roster.len(),
            errors = errors.len(),
            "slate loaded"
        );
        Ok(SlateFeed {
            roster,
            goalie_gaa,
            errors,
        })
    }
}

pub fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn teams_in_games(games: &[ScheduledGame]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut teams = Vec::new();
    for game in games {
        for team in [&game.home, &game.away] {
            if seen.insert(team.clone()) {
                teams.push(team.clone());
            }
        }
    }
    teams
}

pub fn roster_entries_for_games(
    games: &[ScheduledGame],
    rosters: &HashMap<String, Vec<RosterPlayer>>,
) -> Vec<RosterEntry> {
    let mut out = Vec::new();
    for game in games {
        for (team, opponent, is_home) in [
            (&game.home, &game.away, true),
            (&game.away, &game.home, false),
        ] {
            let Some(players) = rosters.get(team) else {
                continue;
            };
            for player in players.iter().filter(|p| !p.is_goalie()) {
                out.push(RosterEntry {
                    player: player.name.clone(),
                    team: team.clone(),
                    opponent: opponent.clone(),
                    is_home,
                    position: Some(player.position_code.clone()).filter(|p| !p.is_empty()),
                });
            }
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    #[serde(rename = "gameWeek", default)]
    game_week: Vec<ScheduleDay>,
}

#[derive(Debug, Deserialize)]
struct ScheduleDay {
    date: String,
    #[serde(default)]
    games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
struct ScheduleGame {
    id: u64,
    #[serde(rename = "homeTeam")]
    home_team: ScheduleTeam,
    #[serde(rename = "awayTeam")]
    away_team: ScheduleTeam,
}

#[derive(Debug, Deserialize)]
struct ScheduleTeam {
    abbrev: String,
}

#[derive(Debug, Deserialize, Default)]
struct RosterResponse {
    #[serde(default)]
    forwards: Vec<RosterPerson>,
    #[serde(default)]
    defensemen: Vec<RosterPerson>,
    #[serde(default)]
    goalies: Vec<RosterPerson>,
}

#[derive(Debug, Deserialize)]
struct RosterPerson {
    #[serde(rename = "firstName")]
    first_name: LocalizedName,
    #[serde(rename = "lastName")]
    last_name: LocalizedName,
    #[serde(rename = "positionCode", default)]
    position_code: String,
}

#[derive(Debug, Deserialize)]
struct LocalizedName {
    #[serde(rename = "default")]
    value: String,
}

#[derive(Debug, Deserialize, Default)]
struct ClubStatsResponse {
    #[serde(default)]
    goalies: Vec<ClubGoalie>,
}

#[derive(Debug, Deserialize)]
struct ClubGoalie {
    #[serde(rename = "gamesPlayed", default)]
    games_played: u32,
    #[serde(rename = "goalsAgainstAverage")]
    goals_against_average: Option<f64>,
}

pub fn parse_schedule_json(raw: &str, date: &str) -> Result<Vec<ScheduledGame>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let resp: ScheduleResponse = serde_json::from_str(trimmed).context("invalid schedule json")?;
    Ok(resp
        .game_week
        .into_iter()
        .filter(|day| day.date == date)
        .flat_map(|day| day.games)
        .map(|g| ScheduledGame {
            id: g.id,
            home: g.home_team.abbrev,
            away: g.away_team.abbrev,
        })
        .collect())
}

pub fn parse_roster_json(raw: &str) -> Result<Vec<RosterPlayer>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let resp: RosterResponse = serde_json::from_str(trimmed).context("invalid roster json")?;
    Ok(resp
        .forwards
        .into_iter()
        .chain(resp.defensemen)
        .chain(resp.goalies)
        .map(|p| RosterPlayer {
            name: format!("{} {}", p.first_name.value.trim(), p.last_name.value.trim()),
            position_code: p.position_code,
        })
        .collect())
}

pub fn parse_club_goalie_gaa(raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let resp: ClubStatsResponse =
        serde_json::from_str(trimmed).context("invalid club stats json")?;
    Ok(resp
        .goalies
        .iter()
        .filter(|g| g.goals_against_average.is_some_and(|gaa| gaa.is_finite() && gaa >= 0.0))
        .max_by_key(|g| g.games_played)
        .and_then(|g| g.goals_against_average))
}
