use crate::ini::IniError;
use crate::transport::GraphqlError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LnrError {
    #[error("no API key configured for profile '{profile}': run 'lnr auth login --profile {profile}'")]
    NoCredential { profile: String },

    #[error("authentication rejected by server: {0}")]
    Unauthorized(String),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid profile name '{0}': use letters, digits, '-' or '_' (max 64)")]
    InvalidProfileName(String),

    #[error("invalid cache key '{0}'")]
    InvalidCacheKey(String),

    #[error("invalid value for '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("unknown setting '{0}': expected one of team, output, cache_ttl, page_size")]
    UnknownSetting(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("API returned errors: {}", join_messages(.errors))]
    PartialApi {
        errors: Vec<GraphqlError>,
        data: Option<serde_json::Value>,
    },

    #[error("rate limited by server (retry after {}s)", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("pagination stalled: server repeated cursor '{0}'")]
    RepeatedCursor(String),

    #[error("pagination broken: server reported more pages without a cursor")]
    MissingCursor,

    #[error("pagination aborted after {0} pages")]
    TooManyPages(usize),

    #[error("malformed {}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: IniError,
    },

    #[error("refusing to write {}", .path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: IniError,
    },

    #[error("home directory not found: set HOME or LNR_CONFIG_DIR")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failure class used by callers to branch without parsing error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    NotFound,
    Validation,
    Transport,
    PartialApi,
    RateLimit,
    Pagination,
    Storage,
}

impl LnrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LnrError::NoCredential { .. } | LnrError::Unauthorized(_) => ErrorKind::Authentication,
            LnrError::ProfileNotFound(_) | LnrError::NotFound(_) => ErrorKind::NotFound,
            LnrError::InvalidProfileName(_)
            | LnrError::InvalidCacheKey(_)
            | LnrError::InvalidSetting { .. }
            | LnrError::UnknownSetting(_)
            | LnrError::Unwritable { .. }
            | LnrError::Validation(_) => ErrorKind::Validation,
            LnrError::Transport(_) => ErrorKind::Transport,
            LnrError::PartialApi { .. } => ErrorKind::PartialApi,
            LnrError::RateLimited { .. } => ErrorKind::RateLimit,
            LnrError::RepeatedCursor(_) | LnrError::MissingCursor | LnrError::TooManyPages(_) => {
                ErrorKind::Pagination
            }
            LnrError::Config { .. } | LnrError::HomeNotFound | LnrError::Io(_) | LnrError::Json(_) => {
                ErrorKind::Storage
            }
        }
    }
}

impl From<reqwest::Error> for LnrError {
    fn from(e: reqwest::Error) -> Self {
        // Strip the URL: it never carries the key, but keeps messages short.
        let e = e.without_url();
        if e.is_timeout() {
            LnrError::Transport(format!("timed out: {e}"))
        } else if e.is_connect() {
            LnrError::Transport(format!("connection failed: {e}"))
        } else {
            LnrError::Transport(e.to_string())
        }
    }
}

fn join_messages(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, LnrError>;
