use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::columns::normalize_headers;
use crate::config::AppConfig;
use crate::edge::{EdgeRow, EdgeStrategy, build_edge_rows, lines_from_table};
use crate::error::SourceError;
use crate::export::{
    EDGE_EXPORT_FILENAME, EDGE_XLSX_EXPORT_FILENAME, EXPORT_FILENAME, ExportReport,
    XLSX_EXPORT_FILENAME, edge_table, player_table, write_csv, write_xlsx,
};
use crate::metrics::{PlayerRow, enrich};
use crate::nhl_fetch::NhlApi;
use crate::params::FilterParams;
use crate::rank::{AggressivenessStrategy, Ranking, filter_and_rank};
use crate::record::records_from_table;
use crate::tabular_source::{RawTable, TabularInput, decode_text, load_table};

pub fn player_rows_from_table(mut table: RawTable) -> Result<Vec<PlayerRow>, SourceError> {
    normalize_headers(&mut table);
    let records = records_from_table(&table)?;
    Ok(enrich(records))
}

pub fn load_player_rows(input: &TabularInput) -> Result<Vec<PlayerRow>, SourceError> {
    player_rows_from_table(load_table(input)?)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Table(String),
    Pasted(PathBuf),
    Slate(String),
}

impl SourceSpec {
    pub fn label(&self) -> String {
        match self {
            SourceSpec::Table(src) => src.clone(),
            SourceSpec::Pasted(path) => format!("pasted {}", path.display()),
            SourceSpec::Slate(date) => format!("NHL slate {date}"),
        }
    }
}

pub struct LoadedDataset {
    pub dataset: Dataset,
    pub warnings: Vec<String>,
}

pub fn load_dataset(spec: &SourceSpec, cfg: &AppConfig) -> Result<LoadedDataset> {
    match spec {
        SourceSpec::Table(src) => {
            let rows = load_player_rows(&TabularInput::from_arg(src))
                .with_context(|| format!("failed loading {src}"))?;
            Ok(LoadedDataset {
                dataset: Dataset::Season(rows),
                warnings: Vec::new(),
            })
        }
        SourceSpec::Pasted(path) => {
            let text = read_pasted(path)?;
            let rows = load_player_rows(&TabularInput::Pasted(text))
                .context("failed reading pasted text")?;
            Ok(LoadedDataset {
                dataset: Dataset::Season(rows),
                warnings: Vec::new(),
            })
        }
        SourceSpec::Slate(date) => {
            let slate = load_slate(cfg, date)?;
            Ok(LoadedDataset {
                dataset: Dataset::Slate(slate.rows),
                warnings: slate.errors,
            })
        }
    }
}

fn read_pasted(path: &Path) -> Result<String> {
    let data = if path.as_os_str() == "-" {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("failed reading stdin")?;
        data
    } else {
        std::fs::read(path).with_context(|| format!("failed reading {}", path.display()))?
    };
    Ok(decode_text(&data)?)
}

#[derive(Debug, Clone)]
pub enum Dataset {
    Season(Vec<PlayerRow>),
    Slate(Vec<EdgeRow>),
}

#[derive(Debug, Clone)]
pub enum RankedView {
    Season(Ranking<PlayerRow>),
    Slate(Ranking<EdgeRow>),
}

impl Dataset {
    pub fn len(&self) -> usize {
        match self {
            Dataset::Season(rows) => rows.len(),
            Dataset::Slate(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rank(&self, params: &FilterParams) -> RankedView {
        match self {
            Dataset::Season(rows) => {
                RankedView::Season(filter_and_rank(&AggressivenessStrategy, rows, params))
            }
            Dataset::Slate(rows) => RankedView::Slate(filter_and_rank(&EdgeStrategy, rows, params)),
        }
    }
}

impl RankedView {
    pub fn len(&self) -> usize {
        match self {
            RankedView::Season(r) => r.len(),
            RankedView::Slate(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn display_len(&self) -> usize {
        match self {
            RankedView::Season(r) => r.display().len(),
            RankedView::Slate(r) => r.display().len(),
        }
    }

    pub fn status_line(&self) -> String {
        match self {
            RankedView::Season(r) => r.status_line(),
            RankedView::Slate(r) => r.status_line(),
        }
    }

    pub fn export_table(&self) -> Vec<Vec<String>> {
        match self {
            RankedView::Season(r) => player_table(r.rows()),
            RankedView::Slate(r) => edge_table(r.rows()),
        }
    }

    pub fn export_csv(&self, dir: &Path) -> Result<ExportReport> {
        let name = match self {
            RankedView::Season(_) => EXPORT_FILENAME,
            RankedView::Slate(_) => EDGE_EXPORT_FILENAME,
        };
        write_csv(&dir.join(name), &self.export_table())
    }

    pub fn export_xlsx(&self, dir: &Path) -> Result<ExportReport> {
        let (name, sheet) = match self {
            RankedView::Season(_) => (XLSX_EXPORT_FILENAME, "Targets"),
            RankedView::Slate(_) => (EDGE_XLSX_EXPORT_FILENAME, "Slate"),
        };
        write_xlsx(&dir.join(name), sheet, &self.export_table())
    }
}

pub struct SlateLoad {
    pub rows: Vec<EdgeRow>,
    pub errors: Vec<String>,
}

pub fn load_slate(cfg: &AppConfig, date: &str) -> Result<SlateLoad> {
    let api = NhlApi::new(cfg.nhl_api_base.clone());
    let feed = api
        .fetch_slate(date)
        .with_context(|| format!("failed loading schedule for {date}"))?;
    let mut errors = feed.errors;

    let stats = match cfg.stats_url.as_deref() {
        Some(src) => match load_player_rows(&TabularInput::from_arg(src)) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(source = src, error = %err, "stats feed unavailable");
                errors.push(format!("stats feed: {err}"));
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let lines = match cfg.lines_path.as_ref() {
        Some(path) => match load_table(&TabularInput::File(path.clone())) {
            Ok(table) => lines_from_table(table),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "sportsbook lines unavailable");
                errors.push(format!("lines: {err}"));
                HashMap::new()
            }
        },
        None => HashMap::new(),
    };

    let rows = build_edge_rows(&feed.roster, &stats, &lines, &feed.goalie_gaa);
    info!(
        skaters = rows.len(),
        stats_rows = stats.len(),
        lines = lines.len(),
        "slate joined"
    );
    Ok(SlateLoad { rows, errors })
}
