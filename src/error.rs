use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("http {status} from {url}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("no text encoding produced a readable table (tried {attempts})")]
    Undecodable { attempts: String },

    #[error("spreadsheet could not be read: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("source contains no header row")]
    EmptySource,

    #[error("no player column found (headers: {headers})")]
    MissingPlayerColumn { headers: String },
}
