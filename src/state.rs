use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::export::ExportReport;
use crate::params::{FilterParams, ParamControl};
use crate::pipeline::{Dataset, RankedView, SourceSpec};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub params: FilterParams,
    pub default_params: FilterParams,
    pub control: ParamControl,
    pub source: Option<SourceSpec>,
    pub dataset: Option<Dataset>,
    pub view: Option<RankedView>,
    pub load_error: Option<String>,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export_dir: PathBuf,
    pub last_export: Option<String>,
}

impl AppState {
    pub fn new(params: FilterParams, export_dir: PathBuf) -> Self {
        Self {
            params,
            default_params: params,
            control: ParamControl::MinGamesPlayed,
            source: None,
            dataset: None,
            view: None,
            load_error: None,
            selected: 0,
            logs: VecDeque::new(),
            help_overlay: false,
            export_dir,
            last_export: None,
        }
    }

    pub fn set_dataset(&mut self, source: SourceSpec, dataset: Dataset) {
        self.push_log(format!("Loaded {} rows from {}", dataset.len(), source.label()));
        self.source = Some(source);
        self.dataset = Some(dataset);
        self.load_error = None;
        self.rerank();
    }

    pub fn set_load_error(&mut self, source: SourceSpec, err: impl std::fmt::Display) {
        let msg = format!("Could not load {}: {err}", source.label());
        self.push_log(msg.clone());
        self.source = Some(source);
        self.dataset = None;
        self.view = None;
        self.selected = 0;
        self.load_error = Some(msg);
    }

    pub fn rerank(&mut self) {
        self.view = self.dataset.as_ref().map(|d| d.rank(&self.params));
        self.clamp_selection();
    }

    pub fn status_line(&self) -> String {
        if let Some(err) = &self.load_error {
            return err.clone();
        }
        match &self.view {
            Some(view) => view.status_line(),
            None => "No source loaded".to_string(),
        }
    }

    pub fn select_next_control(&mut self) {
        self.control = self.control.next();
    }

    pub fn select_prev_control(&mut self) {
        self.control = self.control.prev();
    }

    pub fn adjust_control(&mut self, steps: i32) {
        let next = self.control.adjust(self.params, steps);
        if next != self.params {
            self.params = next;
            self.rerank();
        }
    }

    pub fn reset_params(&mut self) {
        self.params = self.default_params;
        self.rerank();
        self.push_log("Filters reset");
    }

    pub fn select_next(&mut self) {
        let total = self.visible_rows();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1).min(total - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let total = self.visible_rows();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn visible_rows(&self) -> usize {
        self.view.as_ref().map(|v| v.display_len()).unwrap_or(0)
    }

    pub fn export(&mut self, format: ExportFormat) -> Result<ExportReport> {
        let view = self
            .view
            .as_ref()
            .ok_or_else(|| anyhow!("nothing to export"))?;
        let report = match format {
            ExportFormat::Csv => view.export_csv(&self.export_dir),
            ExportFormat::Xlsx => view.export_xlsx(&self.export_dir),
        };
        match &report {
            Ok(r) => {
                let msg = format!("Exported {} rows to {}", r.rows, r.path.display());
                self.last_export = Some(r.path.display().to_string());
                self.push_log(msg);
            }
            Err(err) => self.push_log(format!("Export failed: {err:#}")),
        }
        report
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}
