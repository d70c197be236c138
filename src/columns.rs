use crate::tabular_source::RawTable;

const ALIASES: &[(&str, &str)] = &[
    ("gp", "games_played"),
    ("games", "games_played"),
    ("toi", "time_on_ice_minutes"),
    ("time_on_ice", "time_on_ice_minutes"),
    ("cf", "corsi_for"),
    ("ca", "corsi_against"),
    ("ff", "fenwick_for"),
    ("fa", "fenwick_against"),
    ("sf", "shots_for_team"),
    ("sa", "shots_against_team"),
    ("g", "goals"),
    ("ixg", "individual_expected_goals"),
    ("i_xg", "individual_expected_goals"),
    ("shots", "shots"),
    ("position", "pos"),
    ("name", "player"),
    ("line", "sportsbook_line"),
    ("sog_line", "sportsbook_line"),
    ("prop_line", "sportsbook_line"),
];

const MISSING_MARKERS: &[&str] = &["", "-", "--", "n/a", "na", "null", "none"];

pub fn clean_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

pub fn canonical_column(raw: &str) -> String {
    let cleaned = clean_header(raw);
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == cleaned)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(cleaned)
}

pub fn normalize_headers(table: &mut RawTable) {
    for header in table.headers.iter_mut() {
        *header = canonical_column(header);
    }
}

pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if MISSING_MARKERS.contains(&cleaned.to_ascii_lowercase().as_str()) {
        return None;
    }
    let value = cleaned.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

pub fn parse_minutes(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    let Some((mins, secs)) = trimmed.split_once(':') else {
        return parse_number(trimmed);
    };
    let mins = parse_number(mins)?;
    let secs = parse_number(secs)?;
    if mins < 0.0 || !(0.0..60.0).contains(&secs) {
        return None;
    }
    Some(mins + secs / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_cleaned_and_aliased() {
        let mut table = RawTable {
            headers: ["  Player ", "GP", "TOI", "iXG", "Position", "Shots", "On Ice SF", "CF"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: Vec::new(),
        };
        normalize_headers(&mut table);
        assert_eq!(
            table.headers,
            vec![
                "player",
                "games_played",
                "time_on_ice_minutes",
                "individual_expected_goals",
                "pos",
                "shots",
                "on_ice_sf",
                "corsi_for",
            ]
        );
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let mut table = RawTable {
            headers: vec!["GP".into(), "SA".into(), "Team".into()],
            rows: Vec::new(),
        };
        normalize_headers(&mut table);
        let once = table.headers.clone();
        normalize_headers(&mut table);
        assert_eq!(table.headers, once);
    }

    #[test]
    fn numbers_with_separators_and_whitespace_parse() {
        assert_eq!(parse_number("1,204 "), Some(1204.0));
        assert_eq!(parse_number(" 12.5"), Some(12.5));
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("N/A"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn clock_minutes_convert() {
        assert_eq!(parse_minutes("18:30"), Some(18.5));
        assert_eq!(parse_minutes("1,204.5"), Some(1204.5));
        assert_eq!(parse_minutes("18:75"), None);
    }
}
