use std::fs;
use std::path::PathBuf;

use sog_terminal::export::{EXPORT_FILENAME, XLSX_EXPORT_FILENAME, player_table, to_csv_string};
use sog_terminal::params::FilterParams;
use sog_terminal::config::AppConfig;
use sog_terminal::pipeline::{
    Dataset, RankedView, SourceSpec, load_dataset, load_player_rows, player_rows_from_table,
};
use sog_terminal::rank::{AggressivenessStrategy, filter_and_rank};
use sog_terminal::tabular_source::{TabularInput, parse_csv_text};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn names<'a>(rows: impl IntoIterator<Item = &'a sog_terminal::metrics::PlayerRow>) -> Vec<&'a str> {
    rows.into_iter().map(|r| r.record.player.as_str()).collect()
}

#[test]
fn season_csv_ranks_by_aggressiveness() {
    let rows = load_player_rows(&TabularInput::File(fixture_path("nst_season.csv")))
        .expect("fixture should load");
    assert_eq!(rows.len(), 7);

    let ranking = filter_and_rank(&AggressivenessStrategy, &rows, &FilterParams::default());
    assert_eq!(ranking.considered(), 7);
    assert_eq!(
        names(ranking.rows()),
        vec!["Auston Matthews", "Connor McDavid", "William Nylander", "Zero Team Shots"]
    );

    let matthews = &ranking.rows()[0];
    assert_eq!(matthews.record.time_on_ice_minutes, Some(1204.5));
    assert_eq!(matthews.record.corsi_for, Some(1250.0));
    assert_eq!(matthews.record.goals, Some(30.0));
    assert_eq!(matthews.record.position.as_deref(), Some("C"));

    let zero = &ranking.rows()[3];
    assert_eq!(zero.metrics.shots_per_60, Some(9.0));
    assert_eq!(zero.metrics.individual_shot_share, None);
}

#[test]
fn loosened_filters_admit_more_players() {
    let rows = load_player_rows(&TabularInput::File(fixture_path("nst_season.csv"))).unwrap();
    let params = FilterParams {
        min_games_played: 0,
        min_time_on_ice: 0.0,
        min_shots_per_60: 0.0,
    };
    let ranking = filter_and_rank(&AggressivenessStrategy, &rows, &params);
    // "No Minutes" has no TOI, so it never passes.
    assert_eq!(ranking.len(), 6);
    assert!(!names(ranking.rows()).contains(&"No Minutes"));
}

#[test]
fn exported_csv_reparses_to_same_records() {
    let rows = load_player_rows(&TabularInput::File(fixture_path("nst_season.csv"))).unwrap();
    let ranking = filter_and_rank(&AggressivenessStrategy, &rows, &FilterParams::default());

    let csv = to_csv_string(&player_table(ranking.rows())).unwrap();
    let reparsed = player_rows_from_table(parse_csv_text(&csv).unwrap()).unwrap();

    assert_eq!(reparsed.len(), ranking.len());
    for (before, after) in ranking.rows().iter().zip(&reparsed) {
        assert_eq!(before.record, after.record);
        assert_eq!(before.metrics, after.metrics);
    }
}

#[test]
fn pasted_tabbed_text_runs_through_pipeline() {
    let text = fs::read_to_string(fixture_path("pasted_tabbed.txt")).unwrap();
    let rows = load_player_rows(&TabularInput::Pasted(text)).unwrap();
    assert_eq!(rows.len(), 2);
    let ranking = filter_and_rank(&AggressivenessStrategy, &rows, &FilterParams::default());
    assert_eq!(names(ranking.rows()), vec!["Auston Matthews"]);
}

#[test]
fn legacy_encoded_upload_is_read() {
    let data = b"Player,GP,TOI,Shots\nJesper Bratt\xA0,20,400,60\nTim St\xFCtzle,20,400,80\n".to_vec();
    let rows = load_player_rows(&TabularInput::Bytes {
        name: "upload.csv".to_string(),
        data,
    })
    .unwrap();
    assert_eq!(rows[1].record.player, "Tim Stützle");
    assert_eq!(rows[1].metrics.shots_per_60, Some(12.0));
}

#[test]
fn missing_file_is_reported_as_unreadable() {
    let err = load_player_rows(&TabularInput::File(fixture_path("does_not_exist.csv")))
        .expect_err("missing file should fail");
    assert!(err.to_string().contains("does_not_exist.csv"));
}

#[test]
fn export_writes_full_set_not_display_slice() {
    let mut body = String::from("Player,GP,TOI,Shots\n");
    for i in 0..30 {
        body.push_str(&format!("Player {i},20,300,{}\n", 40 + i));
    }
    let rows = load_player_rows(&TabularInput::Pasted(body)).unwrap();
    let view = Dataset::Season(rows).rank(&FilterParams::default());
    assert_eq!(view.display_len(), 20);

    let dir = tempfile::tempdir().unwrap();
    let report = view.export_csv(dir.path()).unwrap();
    assert_eq!(report.path, dir.path().join(EXPORT_FILENAME));
    assert_eq!(report.rows, 30);
    let written = fs::read_to_string(&report.path).unwrap();
    assert_eq!(written.lines().count(), 31);
    assert!(written.lines().nth(1).unwrap().starts_with("Player 29,"));

    let report = view.export_xlsx(dir.path()).unwrap();
    assert_eq!(report.path, dir.path().join(XLSX_EXPORT_FILENAME));
    assert!(report.path.exists());

    match view {
        RankedView::Season(r) => assert_eq!(r.len(), 30),
        RankedView::Slate(_) => panic!("expected season view"),
    }
}

#[test]
fn exported_workbook_reloads_to_same_records() {
    let rows = load_player_rows(&TabularInput::File(fixture_path("nst_season.csv"))).unwrap();
    let view = Dataset::Season(rows).rank(&FilterParams::default());
    let dir = tempfile::tempdir().unwrap();
    let report = view.export_xlsx(dir.path()).unwrap();

    let reloaded = load_player_rows(&TabularInput::File(report.path)).unwrap();
    let RankedView::Season(ranking) = &view else {
        panic!("expected season view");
    };
    assert_eq!(reloaded.len(), ranking.len());
    for (before, after) in ranking.rows().iter().zip(&reloaded) {
        assert_eq!(before.record, after.record);
    }
}

#[test]
fn pasted_file_in_legacy_encoding_keeps_accents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pasted.txt");
    fs::write(&path, b"Player\tGP\tTOI\tShots\nTim St\xFCtzle\t20\t400\t80\n").unwrap();

    let loaded = load_dataset(&SourceSpec::Pasted(path), &AppConfig::from_env()).unwrap();
    let Dataset::Season(rows) = loaded.dataset else {
        panic!("pasted text should load as season rows");
    };
    assert_eq!(rows[0].record.player, "Tim Stützle");
    assert_eq!(rows[0].metrics.shots_per_60, Some(12.0));
}
