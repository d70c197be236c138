#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub min_games_played: u32,
    pub min_time_on_ice: f64,
    pub min_shots_per_60: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            min_games_played: 10,
            min_time_on_ice: 150.0,
            min_shots_per_60: 6.0,
        }
    }
}

impl FilterParams {
    pub fn clamped(self) -> Self {
        let (gp_lo, gp_hi) = ParamControl::MinGamesPlayed.bounds();
        let (toi_lo, toi_hi) = ParamControl::MinTimeOnIce.bounds();
        let (sp_lo, sp_hi) = ParamControl::MinShotsPer60.bounds();
        Self {
            min_games_played: (self.min_games_played as f64).clamp(gp_lo, gp_hi) as u32,
            min_time_on_ice: clamp_finite(self.min_time_on_ice, toi_lo, toi_hi),
            min_shots_per_60: clamp_finite(self.min_shots_per_60, sp_lo, sp_hi),
        }
    }
}

fn clamp_finite(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    value.clamp(lo, hi)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamControl {
    MinGamesPlayed,
    MinTimeOnIce,
    MinShotsPer60,
}

impl ParamControl {
    pub const ALL: [ParamControl; 3] = [
        ParamControl::MinGamesPlayed,
        ParamControl::MinTimeOnIce,
        ParamControl::MinShotsPer60,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ParamControl::MinGamesPlayed => "Min GP",
            ParamControl::MinTimeOnIce => "Min TOI",
            ParamControl::MinShotsPer60 => "Min Shots/60",
        }
    }

    pub fn bounds(self) -> (f64, f64) {
        match self {
            ParamControl::MinGamesPlayed => (0.0, 82.0),
            ParamControl::MinTimeOnIce => (0.0, 2000.0),
            ParamControl::MinShotsPer60 => (0.0, 20.0),
        }
    }

    pub fn step(self) -> f64 {
        match self {
            ParamControl::MinGamesPlayed => 1.0,
            ParamControl::MinTimeOnIce => 10.0,
            ParamControl::MinShotsPer60 => 0.5,
        }
    }

    pub fn value(self, params: &FilterParams) -> f64 {
        match self {
            ParamControl::MinGamesPlayed => params.min_games_played as f64,
            ParamControl::MinTimeOnIce => params.min_time_on_ice,
            ParamControl::MinShotsPer60 => params.min_shots_per_60,
        }
    }

    pub fn format_value(self, params: &FilterParams) -> String {
        match self {
            ParamControl::MinGamesPlayed => params.min_games_played.to_string(),
            ParamControl::MinTimeOnIce => format!("{:.0}", params.min_time_on_ice),
            ParamControl::MinShotsPer60 => format!("{:.1}", params.min_shots_per_60),
        }
    }

    pub fn adjust(self, params: FilterParams, steps: i32) -> FilterParams {
        let (lo, hi) = self.bounds();
        let next = (self.value(&params) + self.step() * steps as f64).clamp(lo, hi);
        let mut out = params;
        match self {
            ParamControl::MinGamesPlayed => out.min_games_played = next.round() as u32,
            ParamControl::MinTimeOnIce => out.min_time_on_ice = next,
            ParamControl::MinShotsPer60 => out.min_shots_per_60 = next,
        }
        out
    }

    pub fn next(self) -> Self {
        match self {
            ParamControl::MinGamesPlayed => ParamControl::MinTimeOnIce,
            ParamControl::MinTimeOnIce => ParamControl::MinShotsPer60,
            ParamControl::MinShotsPer60 => ParamControl::MinGamesPlayed,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ParamControl::MinGamesPlayed => ParamControl::MinShotsPer60,
            ParamControl::MinTimeOnIce => ParamControl::MinGamesPlayed,
            ParamControl::MinShotsPer60 => ParamControl::MinTimeOnIce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_prop_targets() {
        let p = FilterParams::default();
        assert_eq!(p.min_games_played, 10);
        assert_eq!(p.min_time_on_ice, 150.0);
        assert_eq!(p.min_shots_per_60, 6.0);
    }

    #[test]
    fn adjust_steps_and_clamps() {
        let p = FilterParams::default();
        let p = ParamControl::MinShotsPer60.adjust(p, 3);
        assert_eq!(p.min_shots_per_60, 7.5);
        let p = ParamControl::MinTimeOnIce.adjust(p, -100);
        assert_eq!(p.min_time_on_ice, 0.0);
        let p = ParamControl::MinGamesPlayed.adjust(p, 500);
        assert_eq!(p.min_games_played, 82);
    }

    #[test]
    fn clamped_pulls_out_of_range_values_back() {
        let p = FilterParams {
            min_games_played: 400,
            min_time_on_ice: f64::NAN,
            min_shots_per_60: -3.0,
        }
        .clamped();
        assert_eq!(p.min_games_played, 82);
        assert_eq!(p.min_time_on_ice, 0.0);
        assert_eq!(p.min_shots_per_60, 0.0);
    }

    #[test]
    fn control_cycle_wraps() {
        let mut c = ParamControl::MinGamesPlayed;
        for _ in 0..3 {
            c = c.next();
        }
        assert_eq!(c, ParamControl::MinGamesPlayed);
        assert_eq!(c.prev(), ParamControl::MinShotsPer60);
    }
}
