use std::path::PathBuf;

use sog_terminal::metrics::PlayerRow;
use sog_terminal::params::{FilterParams, ParamControl};
use sog_terminal::pipeline::{Dataset, SourceSpec};
use sog_terminal::record::Record;
use sog_terminal::state::{AppState, ExportFormat};

fn row(player: &str, gp: u32, toi: f64, shots: f64) -> PlayerRow {
    PlayerRow::new(Record {
        player: player.to_string(),
        games_played: Some(gp),
        time_on_ice_minutes: Some(toi),
        shots: Some(shots),
        ..Record::default()
    })
}

fn loaded_state() -> AppState {
    let mut state = AppState::new(FilterParams::default(), PathBuf::from("."));
    state.set_dataset(
        SourceSpec::Table("test.csv".to_string()),
        Dataset::Season(vec![
            row("High", 20, 300.0, 60.0),
            row("Mid", 20, 300.0, 35.0),
            row("Low", 20, 300.0, 20.0),
        ]),
    );
    state
}

#[test]
fn parameter_change_reruns_ranking() {
    let mut state = loaded_state();
    // 12.0, 7.0 and 4.0 shots/60.
    assert_eq!(state.view.as_ref().unwrap().len(), 2);

    state.control = ParamControl::MinShotsPer60;
    state.adjust_control(-4);
    assert_eq!(state.params.min_shots_per_60, 4.0);
    assert_eq!(state.view.as_ref().unwrap().len(), 3);

    state.adjust_control(20);
    assert_eq!(state.params.min_shots_per_60, 14.0);
    assert!(state.view.as_ref().unwrap().is_empty());
    assert!(state.status_line().starts_with("No players passed"));

    state.reset_params();
    assert_eq!(state.params, FilterParams::default());
    assert_eq!(state.view.as_ref().unwrap().len(), 2);
}

#[test]
fn selection_clamps_to_visible_rows() {
    let mut state = loaded_state();
    state.select_next();
    state.select_next();
    state.select_next();
    assert_eq!(state.selected, 1);

    state.control = ParamControl::MinGamesPlayed;
    state.adjust_control(50);
    assert_eq!(state.selected, 0);
    state.select_prev();
    assert_eq!(state.selected, 0);
}

#[test]
fn load_error_clears_previous_output() {
    let mut state = loaded_state();
    state.set_load_error(SourceSpec::Table("broken.csv".to_string()), "no player column");
    assert!(state.view.is_none());
    assert!(state.dataset.is_none());
    assert!(state.status_line().contains("broken.csv"));
    assert!(state.export(ExportFormat::Csv).is_err());
}

#[test]
fn export_logs_written_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = loaded_state();
    state.export_dir = dir.path().to_path_buf();
    let report = state.export(ExportFormat::Csv).unwrap();
    assert_eq!(report.rows, 2);
    assert!(state.logs.back().unwrap().starts_with("Exported 2 rows"));
    assert!(state.last_export.is_some());
}
