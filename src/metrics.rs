use crate::record::Record;

pub const SHOTS_WEIGHT: f64 = 0.50;
pub const FENWICK_WEIGHT: f64 = 0.30;
pub const CORSI_WEIGHT: f64 = 0.20;

/// Division that yields `None` for a missing operand, a zero denominator or a
/// non-finite result. Every derived ratio goes through here.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    let value = n / d;
    value.is_finite().then_some(value)
}

pub fn per_60(value: Option<f64>, time_on_ice_minutes: Option<f64>) -> Option<f64> {
    ratio(value, time_on_ice_minutes.map(|toi| toi / 60.0))
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedMetrics {
    pub shots_per_60: Option<f64>,
    pub expected_goals_per_shot: Option<f64>,
    pub corsi_for_per_60: Option<f64>,
    pub fenwick_for_per_60: Option<f64>,
    /// Always defined: missing per-60 terms contribute zero.
    pub aggressiveness_index: f64,
    pub individual_shot_share: Option<f64>,
}

impl DerivedMetrics {
    pub fn derive(record: &Record) -> Self {
        let toi = record.time_on_ice_minutes;
        let shots_per_60 = per_60(record.shots, toi);
        let corsi_for_per_60 = per_60(record.corsi_for, toi);
        let fenwick_for_per_60 = per_60(record.fenwick_for, toi);

        let aggressiveness_index = SHOTS_WEIGHT * shots_per_60.unwrap_or(0.0)
            + FENWICK_WEIGHT * fenwick_for_per_60.unwrap_or(0.0)
            + CORSI_WEIGHT * corsi_for_per_60.unwrap_or(0.0);

        Self {
            shots_per_60,
            expected_goals_per_shot: ratio(record.individual_expected_goals, record.shots),
            corsi_for_per_60,
            fenwick_for_per_60,
            aggressiveness_index,
            individual_shot_share: ratio(record.shots, record.shots_for_team),
        }
    }
}

/// A record together with the metrics derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRow {
    pub record: Record,
    pub metrics: DerivedMetrics,
}

impl PlayerRow {
    pub fn new(record: Record) -> Self {
        let metrics = DerivedMetrics::derive(&record);
        Self { record, metrics }
    }
}

pub fn enrich(records: Vec<Record>) -> Vec<PlayerRow> {
    records.into_iter().map(PlayerRow::new).collect()
}
