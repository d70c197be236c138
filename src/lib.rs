pub mod columns;
pub mod config;
pub mod edge;
pub mod error;
pub mod export;
pub mod http_client;
pub mod logging;
pub mod metrics;
pub mod nhl_fetch;
pub mod params;
pub mod pipeline;
pub mod rank;
pub mod record;
pub mod state;
pub mod tabular_source;
