use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use sog_terminal::config::AppConfig;
use sog_terminal::logging;
use sog_terminal::nhl_fetch;
use sog_terminal::params::FilterParams;
use sog_terminal::pipeline::{RankedView, SourceSpec, load_dataset};

struct Args {
    source: SourceSpec,
    params: FilterParams,
    out_dir: Option<PathBuf>,
    xlsx: bool,
    stats_url: Option<String>,
    lines_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_stderr();

    let mut cfg = AppConfig::from_env();
    let args = parse_args(std::env::args().skip(1).collect(), cfg.params)?;
    if let Some(url) = args.stats_url {
        cfg.stats_url = Some(url);
    }
    if let Some(path) = args.lines_path {
        cfg.lines_path = Some(path);
    }
    let out_dir = args.out_dir.unwrap_or_else(|| cfg.export_dir.clone());

    let loaded = load_dataset(&args.source, &cfg)?;
    for warning in &loaded.warnings {
        eprintln!("warning: {warning}");
    }
    let view = loaded.dataset.rank(&args.params);

    println!("Source: {}", args.source.label());
    println!(
        "Filters: GP >= {}, TOI >= {:.0}, Shots/60 >= {:.1}",
        args.params.min_games_played, args.params.min_time_on_ice, args.params.min_shots_per_60
    );
    println!("{}", view.status_line());
    println!();
    print_display_table(&view);

    if view.is_empty() {
        return Ok(());
    }
    let report = view.export_csv(&out_dir)?;
    println!();
    println!("CSV: {} ({} rows)", report.path.display(), report.rows);
    if args.xlsx {
        let report = view.export_xlsx(&out_dir)?;
        println!("XLSX: {} ({} rows)", report.path.display(), report.rows);
    }
    Ok(())
}

fn parse_args(args: Vec<String>, defaults: FilterParams) -> Result<Args> {
    let mut source = None;
    let mut params = defaults;
    let mut out_dir = None;
    let mut xlsx = false;
    let mut stats_url = None;
    let mut lines_path = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String> {
            inline
                .clone()
                .or_else(|| iter.next())
                .with_context(|| format!("{name} needs a value"))
        };
        match flag.as_str() {
            "--slate" => {
                let date = inline.clone().filter(|d| !d.trim().is_empty());
                source = Some(SourceSpec::Slate(date.unwrap_or_else(nhl_fetch::today)));
            }
            "--paste" => source = Some(SourceSpec::Pasted(PathBuf::from(value("--paste")?))),
            "--min-gp" => {
                params.min_games_played = value("--min-gp")?
                    .trim()
                    .parse()
                    .context("--min-gp must be a whole number")?
            }
            "--min-toi" => {
                params.min_time_on_ice = value("--min-toi")?
                    .trim()
                    .parse()
                    .context("--min-toi must be a number")?
            }
            "--min-sp60" => {
                params.min_shots_per_60 = value("--min-sp60")?
                    .trim()
                    .parse()
                    .context("--min-sp60 must be a number")?
            }
            "--out" => out_dir = Some(PathBuf::from(value("--out")?)),
            "--xlsx" => xlsx = true,
            "--stats" => stats_url = Some(value("--stats")?),
            "--lines" => lines_path = Some(PathBuf::from(value("--lines")?)),
            other if other.starts_with("--") => bail!("unknown flag {other}"),
            _ => source = Some(SourceSpec::Table(arg)),
        }
    }

    let Some(source) = source else {
        bail!(
            "usage: sog_rank <csv|xlsx|url> | --paste FILE|- | --slate[=YYYY-MM-DD] \
             [--min-gp N] [--min-toi MIN] [--min-sp60 RATE] [--out DIR] [--xlsx] \
             [--stats URL] [--lines FILE]"
        );
    };
    Ok(Args {
        source,
        params: params.clamped(),
        out_dir,
        xlsx,
        stats_url,
        lines_path,
    })
}

fn print_display_table(view: &RankedView) {
    match view {
        RankedView::Season(ranking) => {
            println!(
                "{:>3}  {:<24} {:<5} {:>4} {:>7} {:>6} {:>6} {:>6} {:>7}",
                "#", "Player", "Team", "GP", "TOI", "S/60", "CF/60", "FF/60", "Agg"
            );
            for (i, row) in ranking.display().iter().enumerate() {
                let r = &row.record;
                let m = &row.metrics;
                println!(
                    "{:>3}  {:<24} {:<5} {:>4} {:>7} {:>6} {:>6} {:>6} {:>7.2}",
                    i + 1,
                    truncate(&r.player, 24),
                    r.team.as_deref().unwrap_or(""),
                    r.games_played.map(|v| v.to_string()).unwrap_or_default(),
                    fmt_opt(r.time_on_ice_minutes, 0),
                    fmt_opt(m.shots_per_60, 2),
                    fmt_opt(m.corsi_for_per_60, 1),
                    fmt_opt(m.fenwick_for_per_60, 1),
                    m.aggressiveness_index
                );
            }
        }
        RankedView::Slate(ranking) => {
            println!(
                "{:>3}  {:<24} {:<5} {:<5} {:>3} {:>6} {:>6} {:>5} {:>7}",
                "#", "Player", "Team", "Opp", "H/A", "S/60", "Proj", "Line", "Edge"
            );
            for (i, row) in ranking.display().iter().enumerate() {
                println!(
                    "{:>3}  {:<24} {:<5} {:<5} {:>3} {:>6.2} {:>6.2} {:>5} {:>7.2}",
                    i + 1,
                    truncate(&row.entry.player, 24),
                    row.entry.team,
                    row.entry.opponent,
                    if row.entry.is_home { "H" } else { "A" },
                    row.inputs.shots_per_60,
                    row.projected_shots,
                    fmt_opt(row.sportsbook_line, 1),
                    row.edge_score
                );
            }
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".to_string())
}
