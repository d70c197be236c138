use std::collections::HashMap;

use tracing::debug;

use crate::columns::{normalize_headers, parse_number};
use crate::metrics::PlayerRow;
use crate::params::FilterParams;
use crate::rank::RankStrategy;
use crate::record::player_key;
use crate::tabular_source::RawTable;

pub const DEFAULT_TOI_PER_GAME: f64 = 16.0;
pub const DEFAULT_SHOTS_PER_60: f64 = 2.5;
pub const DEFAULT_CORSI_FOR_PER_60: f64 = 0.0;
pub const DEFAULT_OPPONENT_GAA: f64 = 3.0;
pub const HOME_ICE_MULTIPLIER: f64 = 1.05;

const SHOT_RATE_WEIGHT: f64 = 0.55;
const USAGE_WEIGHT: f64 = 0.25;
const CORSI_WEIGHT: f64 = 0.20;

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub player: String,
    pub team: String,
    pub opponent: String,
    pub is_home: bool,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeInputs {
    pub matched: bool,
    pub games_played: Option<u32>,
    pub time_on_ice_minutes: f64,
    pub shots_per_60: f64,
    pub corsi_for_per_60: f64,
}

impl Default for EdgeInputs {
    fn default() -> Self {
        Self {
            matched: false,
            games_played: None,
            time_on_ice_minutes: DEFAULT_TOI_PER_GAME,
            shots_per_60: DEFAULT_SHOTS_PER_60,
            corsi_for_per_60: DEFAULT_CORSI_FOR_PER_60,
        }
    }
}

impl EdgeInputs {
    pub fn from_season(row: &PlayerRow) -> Self {
        let defaults = Self::default();
        let games = row.record.games_played.filter(|gp| *gp > 0);
        let toi_per_game = match (row.record.time_on_ice_minutes, games) {
            (Some(toi), Some(gp)) => toi / gp as f64,
            _ => defaults.time_on_ice_minutes,
        };
        Self {
            matched: true,
            games_played: row.record.games_played,
            time_on_ice_minutes: toi_per_game,
            shots_per_60: row.metrics.shots_per_60.unwrap_or(defaults.shots_per_60),
            corsi_for_per_60: row
                .metrics
                .corsi_for_per_60
                .unwrap_or(defaults.corsi_for_per_60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub entry: RosterEntry,
    pub inputs: EdgeInputs,
    pub opponent_gaa: Option<f64>,
    pub sportsbook_line: Option<f64>,
    pub projected_shots: f64,
    pub goalie_term: f64,
    pub line_delta: f64,
    pub edge_score: f64,
}

impl EdgeRow {
    pub fn new(
        entry: RosterEntry,
        inputs: EdgeInputs,
        opponent_gaa: Option<f64>,
        sportsbook_line: Option<f64>,
    ) -> Self {
        let home = if entry.is_home { HOME_ICE_MULTIPLIER } else { 1.0 };
        let projected_shots = inputs.shots_per_60 * inputs.time_on_ice_minutes / 60.0 * home;
        let raw_signal = SHOT_RATE_WEIGHT * inputs.shots_per_60
            + USAGE_WEIGHT * (inputs.time_on_ice_minutes / 10.0)
            + CORSI_WEIGHT * (inputs.corsi_for_per_60 / 10.0);
        let gaa = opponent_gaa.unwrap_or(DEFAULT_OPPONENT_GAA).max(0.0);
        let goalie_term = 10.0 / (gaa + 1.0);
        let line_delta = sportsbook_line
            .map(|line| projected_shots - line)
            .unwrap_or(0.0);
        let edge_score = raw_signal * home + goalie_term + line_delta;

        Self {
            entry,
            inputs,
            opponent_gaa,
            sportsbook_line,
            projected_shots,
            goalie_term,
            line_delta,
            edge_score,
        }
    }
}

/// Left-join the roster with the stats feed and lines by player key.
///
/// Every roster skater survives. When several stat rows share a name, the one
/// whose team matches the roster team wins, otherwise the first in input order.
pub fn build_edge_rows(
    roster: &[RosterEntry],
    stats: &[PlayerRow],
    lines: &HashMap<String, f64>,
    goalie_gaa: &HashMap<String, f64>,
) -> Vec<EdgeRow> {
    let mut by_key: HashMap<String, Vec<&PlayerRow>> = HashMap::new();
    for row in stats {
        by_key.entry(row.record.key()).or_default().push(row);
    }

    roster
        .iter()
        .map(|entry| {
            let key = player_key(&entry.player);
            let matched = by_key.get(&key).and_then(|candidates| {
                candidates
                    .iter()
                    .find(|row| {
                        row.record
                            .team
                            .as_deref()
                            .is_some_and(|team| team.eq_ignore_ascii_case(&entry.team))
                    })
                    .or_else(|| candidates.first())
                    .copied()
            });
            let inputs = match matched {
                Some(row) => EdgeInputs::from_season(row),
                None => {
                    debug!(player = %entry.player, "no stats match, using defaults");
                    EdgeInputs::default()
                }
            };
            let gaa = goalie_gaa.get(&entry.opponent.to_ascii_uppercase()).copied();
            let line = lines.get(&key).copied();
            EdgeRow::new(entry.clone(), inputs, gaa, line)
        })
        .collect()
}

pub fn lines_from_table(mut table: RawTable) -> HashMap<String, f64> {
    normalize_headers(&mut table);
    let (Some(player_col), Some(line_col)) =
        (table.column("player"), table.column("sportsbook_line"))
    else {
        return HashMap::new();
    };
    let mut lines = HashMap::new();
    for row in &table.rows {
        let Some(name) = row.get(player_col).map(|s| s.trim()).filter(|s| !s.is_empty()) else {
            continue;
        };
        let Some(line) = row.get(line_col).and_then(|c| parse_number(c)) else {
            continue;
        };
        lines.entry(player_key(name)).or_insert(line);
    }
    lines
}

/// Slate strategy: ranks tonight's skaters by edge score.
///
/// Per-game ice time is not comparable with the season-total threshold, so
/// only the shot-rate floor always applies; the games floor applies to players
/// matched in the stats feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeStrategy;

impl RankStrategy for EdgeStrategy {
    type Row = EdgeRow;

    fn name(&self) -> &'static str {
        "edge"
    }

    fn passes(&self, row: &EdgeRow, params: &FilterParams) -> bool {
        if row.inputs.shots_per_60 < params.min_shots_per_60 {
            return false;
        }
        if !row.inputs.matched {
            return true;
        }
        matches!(row.inputs.games_played, Some(gp) if gp >= params.min_games_played)
    }

    fn score(&self, row: &EdgeRow) -> f64 {
        row.edge_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::filter_and_rank;
    use crate::record::Record;

    fn entry(player: &str, team: &str, opponent: &str, is_home: bool) -> RosterEntry {
        RosterEntry {
            player: player.to_string(),
            team: team.to_string(),
            opponent: opponent.to_string(),
            is_home,
            position: Some("C".to_string()),
        }
    }

    fn season(player: &str, team: &str, gp: u32, toi: f64, shots: f64) -> PlayerRow {
        PlayerRow::new(Record {
            player: player.to_string(),
            team: Some(team.to_string()),
            games_played: Some(gp),
            time_on_ice_minutes: Some(toi),
            shots: Some(shots),
            ..Record::default()
        })
    }

    #[test]
    fn unmatched_players_keep_defaults() {
        let rows = build_edge_rows(
            &[entry("Nobody Known", "TOR", "MTL", false)],
            &[],
            &HashMap::new(),
            &HashMap::new(),
        );
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert!(!r.inputs.matched);
        assert_eq!(r.inputs.time_on_ice_minutes, 16.0);
        assert_eq!(r.inputs.shots_per_60, 2.5);
        assert!((r.goalie_term - 2.5).abs() < 1e-12);
        assert_eq!(r.line_delta, 0.0);
    }

    #[test]
    fn join_ignores_case_and_spacing() {
        let stats = vec![season("connor  mcdavid", "EDM", 20, 400.0, 80.0)];
        let rows = build_edge_rows(
            &[entry("Connor McDavid", "EDM", "CGY", true)],
            &stats,
            &HashMap::new(),
            &HashMap::new(),
        );
        assert!(rows[0].inputs.matched);
        assert_eq!(rows[0].inputs.time_on_ice_minutes, 20.0);
        assert_eq!(rows[0].inputs.shots_per_60, 12.0);
    }

    #[test]
    fn same_name_prefers_matching_team() {
        let stats = vec![
            season("Sebastian Aho", "NYI", 20, 400.0, 20.0),
            season("Sebastian Aho", "CAR", 20, 400.0, 60.0),
        ];
        let rows = build_edge_rows(
            &[
                entry("Sebastian Aho", "CAR", "TOR", true),
                entry("Sebastian Aho", "BOS", "TOR", false),
            ],
            &stats,
            &HashMap::new(),
            &HashMap::new(),
        );
        assert_eq!(rows[0].inputs.shots_per_60, 9.0);
        assert_eq!(rows[1].inputs.shots_per_60, 3.0);
    }

    #[test]
    fn edge_score_combines_terms() {
        let inputs = EdgeInputs {
            matched: true,
            games_played: Some(20),
            time_on_ice_minutes: 20.0,
            shots_per_60: 12.0,
            corsi_for_per_60: 20.0,
        };
        let row = EdgeRow::new(entry("A", "TOR", "MTL", true), inputs, Some(1.5), Some(3.5));
        let projected = 12.0 * 20.0 / 60.0 * 1.05;
        assert!((row.projected_shots - projected).abs() < 1e-9);
        assert!((row.goalie_term - 4.0).abs() < 1e-9);
        assert!((row.line_delta - (projected - 3.5)).abs() < 1e-9);
        let raw = 0.55 * 12.0 + 0.25 * 2.0 + 0.20 * 2.0;
        let expected = raw * 1.05 + 4.0 + (projected - 3.5);
        assert!((row.edge_score - expected).abs() < 1e-9);
    }

    #[test]
    fn edge_strategy_filters_on_rate_and_matched_games() {
        let stats = vec![
            season("Shooter", "TOR", 20, 400.0, 60.0),
            season("Rookie", "TOR", 3, 60.0, 12.0),
        ];
        let roster = vec![
            entry("Shooter", "TOR", "MTL", true),
            entry("Rookie", "TOR", "MTL", true),
            entry("Unknown", "TOR", "MTL", true),
        ];
        let rows = build_edge_rows(&roster, &stats, &HashMap::new(), &HashMap::new());
        let params = FilterParams {
            min_games_played: 10,
            min_time_on_ice: 1000.0,
            min_shots_per_60: 2.0,
        };
        let ranking = filter_and_rank(&EdgeStrategy, &rows, &params);
        let names: Vec<&str> = ranking.rows().iter().map(|r| r.entry.player.as_str()).collect();
        assert_eq!(names, vec!["Shooter", "Unknown"]);
    }

    #[test]
    fn lines_table_reads_aliases() {
        let table = RawTable {
            headers: vec!["Name".into(), "SOG Line".into()],
            rows: vec![
                vec!["Auston Matthews".into(), "4.5".into()],
                vec!["auston matthews".into(), "3.5".into()],
                vec!["Bad".into(), "x".into()],
            ],
        };
        let lines = lines_from_table(table);
        assert_eq!(lines.get("auston matthews"), Some(&4.5));
        assert!(!lines.contains_key("bad"));
    }
}
