use tracing::debug;

use crate::columns::{parse_minutes, parse_number};
use crate::error::SourceError;
use crate::tabular_source::RawTable;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub player: String,
    pub team: Option<String>,
    pub position: Option<String>,
    pub games_played: Option<u32>,
    pub time_on_ice_minutes: Option<f64>,
    pub shots: Option<f64>,
    pub goals: Option<f64>,
    pub individual_expected_goals: Option<f64>,
    pub corsi_for: Option<f64>,
    pub corsi_against: Option<f64>,
    pub fenwick_for: Option<f64>,
    pub fenwick_against: Option<f64>,
    pub shots_for_team: Option<f64>,
    pub shots_against_team: Option<f64>,
}

impl Record {
    pub fn key(&self) -> String {
        player_key(&self.player)
    }
}

pub fn player_key(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

struct Columns {
    player: usize,
    team: Option<usize>,
    position: Option<usize>,
    games_played: Option<usize>,
    time_on_ice_minutes: Option<usize>,
    shots: Option<usize>,
    goals: Option<usize>,
    individual_expected_goals: Option<usize>,
    corsi_for: Option<usize>,
    corsi_against: Option<usize>,
    fenwick_for: Option<usize>,
    fenwick_against: Option<usize>,
    shots_for_team: Option<usize>,
    shots_against_team: Option<usize>,
}

impl Columns {
    fn locate(table: &RawTable) -> Result<Self, SourceError> {
        let player = table
            .column("player")
            .ok_or_else(|| SourceError::MissingPlayerColumn {
                headers: table.headers.join(", "),
            })?;
        Ok(Self {
            player,
            team: table.column("team"),
            position: table.column("pos"),
            games_played: table.column("games_played"),
            time_on_ice_minutes: table.column("time_on_ice_minutes"),
            shots: table.column("shots"),
            goals: table.column("goals"),
            individual_expected_goals: table.column("individual_expected_goals"),
            corsi_for: table.column("corsi_for"),
            corsi_against: table.column("corsi_against"),
            fenwick_for: table.column("fenwick_for"),
            fenwick_against: table.column("fenwick_against"),
            shots_for_team: table.column("shots_for_team"),
            shots_against_team: table.column("shots_against_team"),
        })
    }
}

pub fn records_from_table(table: &RawTable) -> Result<Vec<Record>, SourceError> {
    let cols = Columns::locate(table)?;
    let mut records = Vec::with_capacity(table.rows.len());

    for (idx, row) in table.rows.iter().enumerate() {
        let player = cell(row, Some(cols.player)).trim();
        if player.is_empty() {
            debug!(row = idx + 1, "skipping row without player");
            continue;
        }
        records.push(Record {
            player: player.to_string(),
            team: text(row, cols.team),
            position: text(row, cols.position),
            games_played: count(row, cols.games_played),
            time_on_ice_minutes: cell_minutes(row, cols.time_on_ice_minutes),
            shots: amount(row, cols.shots),
            goals: amount(row, cols.goals),
            individual_expected_goals: amount(row, cols.individual_expected_goals),
            corsi_for: amount(row, cols.corsi_for),
            corsi_against: amount(row, cols.corsi_against),
            fenwick_for: amount(row, cols.fenwick_for),
            fenwick_against: amount(row, cols.fenwick_against),
            shots_for_team: amount(row, cols.shots_for_team),
            shots_against_team: amount(row, cols.shots_against_team),
        });
    }

    Ok(records)
}

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
}

fn text(row: &[String], idx: Option<usize>) -> Option<String> {
    let value = cell(row, idx).trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn amount(row: &[String], idx: Option<usize>) -> Option<f64> {
    parse_number(cell(row, idx)).filter(|v| *v >= 0.0)
}

fn cell_minutes(row: &[String], idx: Option<usize>) -> Option<f64> {
    parse_minutes(cell(row, idx)).filter(|v| *v >= 0.0)
}

fn count(row: &[String], idx: Option<usize>) -> Option<u32> {
    amount(row, idx)
        .filter(|v| v.fract() == 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as u32)
}
