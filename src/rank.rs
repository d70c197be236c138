use crate::metrics::PlayerRow;
use crate::params::FilterParams;

/// Rows shown on the presentation surface; exports are never truncated.
pub const DISPLAY_LIMIT: usize = 20;

/// A named scoring formula plugged into the shared filter/rank pass.
pub trait RankStrategy {
    type Row: Clone;

    fn name(&self) -> &'static str;

    /// Missing values in any compared field must fail the filter.
    fn passes(&self, row: &Self::Row, params: &FilterParams) -> bool;

    /// Sort key, descending. Must be finite.
    fn score(&self, row: &Self::Row) -> f64;
}

/// Filtered rows in rank order plus how many rows were considered.
#[derive(Debug, Clone)]
pub struct Ranking<T> {
    strategy: &'static str,
    considered: usize,
    rows: Vec<T>,
}

impl<T> Ranking<T> {
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }

    pub fn considered(&self) -> usize {
        self.considered
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn display(&self) -> &[T] {
        &self.rows[..self.rows.len().min(DISPLAY_LIMIT)]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn status_line(&self) -> String {
        if self.rows.is_empty() {
            return format!(
                "No players passed the filters ({} considered)",
                self.considered
            );
        }
        format!(
            "{} of {} players passed, showing top {}",
            self.rows.len(),
            self.considered,
            self.display().len()
        )
    }
}

/// Keep rows the strategy accepts, then stable-sort them by score descending.
/// Equal scores keep their input order.
pub fn filter_and_rank<S: RankStrategy>(
    strategy: &S,
    rows: &[S::Row],
    params: &FilterParams,
) -> Ranking<S::Row> {
    let mut kept: Vec<S::Row> = rows
        .iter()
        .filter(|row| strategy.passes(row, params))
        .cloned()
        .collect();
    kept.sort_by(|a, b| strategy.score(b).total_cmp(&strategy.score(a)));
    Ranking {
        strategy: strategy.name(),
        considered: rows.len(),
        rows: kept,
    }
}

/// Season-table strategy: ranks by the aggressiveness index.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggressivenessStrategy;

impl RankStrategy for AggressivenessStrategy {
    type Row = PlayerRow;

    fn name(&self) -> &'static str {
        "aggressiveness"
    }

    fn passes(&self, row: &PlayerRow, params: &FilterParams) -> bool {
        let games_ok = matches!(row.record.games_played, Some(gp) if gp >= params.min_games_played);
        let toi_ok =
            matches!(row.record.time_on_ice_minutes, Some(toi) if toi >= params.min_time_on_ice);
        let rate_ok =
            matches!(row.metrics.shots_per_60, Some(rate) if rate >= params.min_shots_per_60);
        games_ok && toi_ok && rate_ok
    }

    fn score(&self, row: &PlayerRow) -> f64 {
        row.metrics.aggressiveness_index
    }
}
