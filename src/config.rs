use std::env;
use std::path::PathBuf;

use crate::params::FilterParams;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NHL_API_BASE: &str = "https://api-web.nhle.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub params: FilterParams,
    pub nhl_api_base: String,
    pub stats_url: Option<String>,
    pub lines_path: Option<PathBuf>,
    pub export_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = FilterParams::default();
        let params = FilterParams {
            min_games_played: env_parse("SOG_MIN_GAMES_PLAYED").unwrap_or(defaults.min_games_played),
            min_time_on_ice: env_parse("SOG_MIN_TIME_ON_ICE").unwrap_or(defaults.min_time_on_ice),
            min_shots_per_60: env_parse("SOG_MIN_SHOTS_PER_60").unwrap_or(defaults.min_shots_per_60),
        }
        .clamped();

        let nhl_api_base = env_string("SOG_NHL_API_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_NHL_API_BASE.to_string());

        Self {
            params,
            nhl_api_base,
            stats_url: env_string("SOG_STATS_URL"),
            lines_path: env_string("SOG_LINES_PATH").map(PathBuf::from),
            export_dir: env_string("SOG_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            log_file: env_string("SOG_LOG_FILE").map(PathBuf::from),
        }
    }
}

pub fn http_timeout_secs() -> u64 {
    env_parse::<u64>("SOG_HTTP_TIMEOUT_SECS")
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
        .clamp(1, 120)
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse::<T>().ok())
}
