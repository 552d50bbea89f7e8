use crate::secret::Secret;
use std::path::PathBuf;

pub const API_KEY_VAR: &str = "LNR_API_KEY";
pub const PROFILE_VAR: &str = "LNR_PROFILE";
pub const LEGACY_API_KEY_VAR: &str = "LINEAR_API_KEY";
pub const CONFIG_DIR_VAR: &str = "LNR_CONFIG_DIR";
pub const CREDENTIALS_FILE_VAR: &str = "LNR_CREDENTIALS_FILE";
pub const CONFIG_FILE_VAR: &str = "LNR_CONFIG_FILE";
pub const CACHE_DIR_VAR: &str = "LNR_CACHE_DIR";
pub const API_URL_VAR: &str = "LNR_API_URL";
pub const XDG_CONFIG_HOME_VAR: &str = "XDG_CONFIG_HOME";

/// Snapshot of every environment input, taken once per process.
///
/// Components receive this by reference instead of reading `std::env`, so
/// resolution stays a pure function of its arguments. Empty variables are
/// treated as unset.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub api_key: Option<Secret>,
    pub profile: Option<String>,
    pub legacy_api_key: Option<Secret>,
    pub config_dir: Option<PathBuf>,
    pub credentials_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub xdg_config_home: Option<PathBuf>,
    pub home: Option<PathBuf>,
}

impl Environment {
    pub fn from_process() -> Self {
        let mut env = Self::from_lookup(|name| std::env::var(name).ok());
        env.home = home::home_dir();
        env
    }

    /// Build from an arbitrary variable lookup. `home` is left unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let path = |name: &str| text(name).map(PathBuf::from);
        Environment {
            api_key: lookup(API_KEY_VAR).and_then(Secret::new),
            profile: text(PROFILE_VAR).map(|v| v.trim().to_string()),
            legacy_api_key: lookup(LEGACY_API_KEY_VAR).and_then(Secret::new),
            config_dir: path(CONFIG_DIR_VAR),
            credentials_file: path(CREDENTIALS_FILE_VAR),
            config_file: path(CONFIG_FILE_VAR),
            cache_dir: path(CACHE_DIR_VAR),
            api_url: text(API_URL_VAR),
            xdg_config_home: path(XDG_CONFIG_HOME_VAR),
            home: None,
        }
    }
}
