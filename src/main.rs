use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};

use sog_terminal::config::AppConfig;
use sog_terminal::edge::EdgeRow;
use sog_terminal::metrics::PlayerRow;
use sog_terminal::nhl_fetch;
use sog_terminal::params::ParamControl;
use sog_terminal::pipeline::{RankedView, SourceSpec, load_dataset};
use sog_terminal::state::{AppState, ExportFormat};
use sog_terminal::{logging, rank::DISPLAY_LIMIT};

struct App {
    state: AppState,
    cfg: AppConfig,
    should_quit: bool,
}

impl App {
    fn new(cfg: AppConfig) -> Self {
        Self {
            state: AppState::new(cfg.params, cfg.export_dir.clone()),
            cfg,
            should_quit: false,
        }
    }

    fn load(&mut self, spec: SourceSpec) {
        match load_dataset(&spec, &self.cfg) {
            Ok(loaded) => {
                for warning in loaded.warnings {
                    self.state.push_log(format!("warning: {warning}"));
                }
                self.state.set_dataset(spec, loaded.dataset);
            }
            Err(err) => self.state.set_load_error(spec, format!("{err:#}")),
        }
    }

    fn reload(&mut self) {
        if let Some(spec) = self.state.source.clone() {
            self.load(spec);
        } else {
            self.state.push_log("No source to reload");
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.state.help_overlay = false;
            } else if key.code == KeyCode::Char('q') {
                self.should_quit = true;
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Tab => self.state.select_next_control(),
            KeyCode::BackTab => self.state.select_prev_control(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') => self.state.adjust_control(1),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-') => self.state.adjust_control(-1),
            KeyCode::PageUp => self.state.adjust_control(10),
            KeyCode::PageDown => self.state.adjust_control(-10),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('r') => self.state.reset_params(),
            KeyCode::Char('R') => self.reload(),
            KeyCode::Char('e') => {
                let _ = self.state.export(ExportFormat::Csv);
            }
            KeyCode::Char('x') => {
                let _ = self.state.export(ExportFormat::Xlsx);
            }
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = AppConfig::from_env();
    logging::init_file(cfg.log_file.as_deref())?;

    let spec = parse_source_arg();
    let mut app = App::new(cfg);
    match spec {
        Some(spec) => app.load(spec),
        None => app
            .state
            .push_log("No source given: pass a CSV/XLSX path or URL, --paste FILE, or --slate[=DATE]"),
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn parse_source_arg() -> Option<SourceSpec> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if arg == "--slate" {
            return Some(SourceSpec::Slate(nhl_fetch::today()));
        }
        if let Some(date) = arg.strip_prefix("--slate=") {
            let date = date.trim();
            return Some(SourceSpec::Slate(if date.is_empty() {
                nhl_fetch::today()
            } else {
                date.to_string()
            }));
        }
        if let Some(path) = arg.strip_prefix("--paste=") {
            return Some(SourceSpec::Pasted(PathBuf::from(path.trim())));
        }
        if arg == "--paste" {
            let next = args.get(idx + 1).map(|s| s.as_str()).unwrap_or("-");
            return Some(SourceSpec::Pasted(PathBuf::from(next)));
        }
        if !arg.starts_with("--") && !arg.trim().is_empty() {
            return Some(SourceSpec::Table(arg.clone()));
        }
    }
    None
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_controls(frame, chunks[1], &app.state);
    render_table(frame, chunks[2], &app.state);
    render_console(frame, chunks[3], &app.state);

    let footer = Paragraph::new(footer_text()).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);

    if app.state.help_overlay {
        let area = frame.size();
        render_help_overlay(frame, area);
    }
}

fn header_text(state: &AppState) -> String {
    let source = state
        .source
        .as_ref()
        .map(|s| s.label())
        .unwrap_or_else(|| "no source".to_string());
    let strategy = match &state.view {
        Some(RankedView::Season(_)) => "Aggressiveness",
        Some(RankedView::Slate(_)) => "Edge",
        None => "-",
    };
    let line1 = format!("  ___  SOG TERMINAL | {source} | Rank: {strategy}");
    let line2 = match &state.last_export {
        Some(path) => format!(" (___)  Last export: {path}"),
        None => " (___)".to_string(),
    };
    let line3 = format!("       {}", state.status_line());
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text() -> &'static str {
    "Tab Filter | ←/→ Adjust | PgUp/PgDn ×10 | j/k Move | r Reset | R Reload | e CSV | x XLSX | ? Help | q Quit"
}

fn render_controls(frame: &mut Frame, area: Rect, state: &AppState) {
    let spans: Vec<Span> = ParamControl::ALL
        .iter()
        .flat_map(|control| {
            let selected = *control == state.control;
            let style = if selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let (lo, hi) = control.bounds();
            [
                Span::styled(
                    format!(" {}: {} ", control.label(), control.format_value(&state.params)),
                    style,
                ),
                Span::styled(
                    format!("[{lo:.0}-{hi:.0}]   "),
                    Style::default().fg(Color::DarkGray),
                ),
            ]
        })
        .collect();
    let controls = Paragraph::new(Line::from(spans))
        .block(Block::default().title("Filters").borders(Borders::ALL));
    frame.render_widget(controls, area);
}

fn render_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(format!("Top {DISPLAY_LIMIT}"))
        .borders(Borders::ALL);
    let Some(view) = &state.view else {
        let empty = Paragraph::new(state.status_line())
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };
    if view.is_empty() {
        let empty = Paragraph::new(view.status_line())
            .style(Style::default().fg(Color::Yellow))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header_style = Style::default().add_modifier(Modifier::BOLD);
    let (header, rows, widths) = match view {
        RankedView::Season(ranking) => (
            season_header(),
            ranking
                .display()
                .iter()
                .enumerate()
                .map(|(i, r)| season_row(i, r))
                .collect::<Vec<_>>(),
            season_widths(),
        ),
        RankedView::Slate(ranking) => (
            slate_header(),
            ranking
                .display()
                .iter()
                .enumerate()
                .map(|(i, r)| slate_row(i, r))
                .collect::<Vec<_>>(),
            slate_widths(),
        ),
    };

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(header_style))
        .block(block)
        .highlight_style(Style::default().fg(Color::White).bg(Color::DarkGray));
    let mut table_state = TableState::default();
    table_state.select(Some(state.selected));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn season_header() -> Vec<Cell<'static>> {
    [
        "#", "Player", "Team", "Pos", "GP", "TOI", "S/60", "CF/60", "FF/60", "xG/S", "Share", "Agg",
    ]
    .into_iter()
    .map(Cell::from)
    .collect()
}

fn season_widths() -> Vec<Constraint> {
    vec![
        Constraint::Length(3),
        Constraint::Min(18),
        Constraint::Length(5),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
    ]
}

fn season_row(idx: usize, row: &PlayerRow) -> Row<'static> {
    let r = &row.record;
    let m = &row.metrics;
    Row::new(vec![
        Cell::from((idx + 1).to_string()),
        Cell::from(r.player.clone()),
        Cell::from(r.team.clone().unwrap_or_default()),
        Cell::from(r.position.clone().unwrap_or_default()),
        Cell::from(r.games_played.map(|v| v.to_string()).unwrap_or_else(|| "-".into())),
        Cell::from(fmt_opt(r.time_on_ice_minutes, 0)),
        Cell::from(fmt_opt(m.shots_per_60, 2)),
        Cell::from(fmt_opt(m.corsi_for_per_60, 1)),
        Cell::from(fmt_opt(m.fenwick_for_per_60, 1)),
        Cell::from(fmt_opt(m.expected_goals_per_shot, 3)),
        Cell::from(fmt_opt(m.individual_shot_share.map(|s| s * 100.0), 1)),
        Cell::from(format!("{:.2}", m.aggressiveness_index))
            .style(Style::default().fg(Color::Cyan)),
    ])
}

fn slate_header() -> Vec<Cell<'static>> {
    [
        "#", "Player", "Team", "Opp", "H/A", "Stats", "TOI/G", "S/60", "Proj", "Line", "GAA", "Edge",
    ]
    .into_iter()
    .map(Cell::from)
    .collect()
}

fn slate_widths() -> Vec<Constraint> {
    vec![
        Constraint::Length(3),
        Constraint::Min(18),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(4),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(6),
    ]
}

fn slate_row(idx: usize, row: &EdgeRow) -> Row<'static> {
    let matched_style = if row.inputs.matched {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Row::new(vec![
        Cell::from((idx + 1).to_string()),
        Cell::from(row.entry.player.clone()),
        Cell::from(row.entry.team.clone()),
        Cell::from(row.entry.opponent.clone()),
        Cell::from(if row.entry.is_home { "H" } else { "A" }),
        Cell::from(if row.inputs.matched { "yes" } else { "dflt" }).style(matched_style),
        Cell::from(format!("{:.1}", row.inputs.time_on_ice_minutes)),
        Cell::from(format!("{:.2}", row.inputs.shots_per_60)),
        Cell::from(format!("{:.2}", row.projected_shots)),
        Cell::from(fmt_opt(row.sportsbook_line, 1)),
        Cell::from(fmt_opt(row.opponent_gaa, 2)),
        Cell::from(format!("{:.2}", row.edge_score)).style(Style::default().fg(Color::Cyan)),
    ])
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = state.logs.len().saturating_sub(visible);
    let text = state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let console = Paragraph::new(text).block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, area);
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "SOG Terminal - Help",
        "",
        "Filters:",
        "  Tab / Shift-Tab   Select filter",
        "  ←/→ or h/l, +/-   Adjust by one step",
        "  PgUp / PgDn       Adjust by ten steps",
        "  r                 Reset filters",
        "",
        "Table:",
        "  j/k or ↑/↓        Move selection",
        "  R                 Reload source",
        "  e                 Export CSV (full ranked set)",
        "  x                 Export XLSX",
        "",
        "  ?                 Toggle help",
        "  q                 Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
