use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::edge::EdgeRow;
use crate::metrics::PlayerRow;

pub const EXPORT_FILENAME: &str = "sog_targets.csv";
pub const EDGE_EXPORT_FILENAME: &str = "sog_edge_slate.csv";
pub const XLSX_EXPORT_FILENAME: &str = "sog_targets.xlsx";
pub const EDGE_XLSX_EXPORT_FILENAME: &str = "sog_edge_slate.xlsx";

pub struct ExportReport {
    pub path: PathBuf,
    pub rows: usize,
}

const PLAYER_HEADER: &[&str] = &[
    "player",
    "team",
    "pos",
    "games_played",
    "time_on_ice_minutes",
    "shots",
    "goals",
    "individual_expected_goals",
    "corsi_for",
    "corsi_against",
    "fenwick_for",
    "fenwick_against",
    "shots_for_team",
    "shots_against_team",
    "shots_per_60",
    "expected_goals_per_shot",
    "corsi_for_per_60",
    "fenwick_for_per_60",
    "aggressiveness_index",
    "individual_shot_share",
];

const EDGE_HEADER: &[&str] = &[
    "player",
    "team",
    "opponent",
    "home",
    "pos",
    "matched_stats",
    "games_played",
    "time_on_ice_minutes",
    "shots_per_60",
    "corsi_for_per_60",
    "opponent_gaa",
    "sportsbook_line",
    "projected_shots",
    "goalie_term",
    "line_delta",
    "edge_score",
];

pub fn player_table(rows: &[PlayerRow]) -> Vec<Vec<String>> {
    let mut out = vec![PLAYER_HEADER.iter().map(|h| h.to_string()).collect()];
    for row in rows {
        let r = &row.record;
        let m = &row.metrics;
        out.push(vec![
            r.player.clone(),
            r.team.clone().unwrap_or_default(),
            r.position.clone().unwrap_or_default(),
            opt_to_string(r.games_played),
            opt_to_string(r.time_on_ice_minutes),
            opt_to_string(r.shots),
            opt_to_string(r.goals),
            opt_to_string(r.individual_expected_goals),
            opt_to_string(r.corsi_for),
            opt_to_string(r.corsi_against),
            opt_to_string(r.fenwick_for),
            opt_to_string(r.fenwick_against),
            opt_to_string(r.shots_for_team),
            opt_to_string(r.shots_against_team),
            opt_fixed(m.shots_per_60, 3),
            opt_fixed(m.expected_goals_per_shot, 4),
            opt_fixed(m.corsi_for_per_60, 3),
            opt_fixed(m.fenwick_for_per_60, 3),
            format!("{:.3}", m.aggressiveness_index),
            opt_fixed(m.individual_shot_share, 4),
        ]);
    }
    out
}

pub fn edge_table(rows: &[EdgeRow]) -> Vec<Vec<String>> {
    let mut out = vec![EDGE_HEADER.iter().map(|h| h.to_string()).collect()];
    for row in rows {
        out.push(vec![
            row.entry.player.clone(),
            row.entry.team.clone(),
            row.entry.opponent.clone(),
            if row.entry.is_home { "yes" } else { "no" }.to_string(),
            row.entry.position.clone().unwrap_or_default(),
            if row.inputs.matched { "yes" } else { "no" }.to_string(),
            opt_to_string(row.inputs.games_played),
            format!("{:.2}", row.inputs.time_on_ice_minutes),
            format!("{:.3}", row.inputs.shots_per_60),
            format!("{:.3}", row.inputs.corsi_for_per_60),
            opt_fixed(row.opponent_gaa, 2),
            opt_to_string(row.sportsbook_line),
            format!("{:.3}", row.projected_shots),
            format!("{:.3}", row.goalie_term),
            format!("{:.3}", row.line_delta),
            format!("{:.3}", row.edge_score),
        ]);
    }
    out
}

pub fn to_csv_string(table: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in table {
        writer.write_record(row).context("write csv row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("flush csv: {}", err.error()))?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

pub fn write_csv(path: &Path, table: &[Vec<String>]) -> Result<ExportReport> {
    let body = to_csv_string(table)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    fs::write(path, body).with_context(|| format!("failed writing csv to {}", path.display()))?;
    let rows = table.len().saturating_sub(1);
    info!(path = %path.display(), rows, "csv export written");
    Ok(ExportReport {
        path: path.to_path_buf(),
        rows,
    })
}

pub fn write_xlsx(path: &Path, sheet_name: &str, table: &[Vec<String>]) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;
        write_rows(sheet, table)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    let rows = table.len().saturating_sub(1);
    info!(path = %path.display(), rows, "xlsx export written");
    Ok(ExportReport {
        path: path.to_path_buf(),
        rows,
    })
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let number = if row_idx == 0 {
                None
            } else {
                value.parse::<f64>().ok().filter(|v| v.is_finite())
            };
            match number {
                Some(n) => worksheet.write_number(row_idx as u32, col_idx as u16, n),
                None => worksheet.write_string(row_idx as u32, col_idx as u16, value),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_fixed(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_default()
}
