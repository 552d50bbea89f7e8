use crate::env::Environment;
use crate::error::{LnrError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File name constants
// ---------------------------------------------------------------------------

pub const APP_DIR: &str = "lnr";
pub const CREDENTIALS_FILE: &str = "credentials";
pub const CONFIG_FILE: &str = "config";
pub const CACHE_DIR: &str = "cache";
pub const CACHE_EXT: &str = "json";

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Every on-disk location the tool touches, resolved once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config_dir: PathBuf,
    pub credentials_file: PathBuf,
    pub settings_file: PathBuf,
    pub cache_dir: PathBuf,
}

impl Paths {
    /// Resolve locations.
    ///
    /// Priority for the config directory:
    /// 1. `LNR_CONFIG_DIR`
    /// 2. `$XDG_CONFIG_HOME/lnr`
    /// 3. `~/.config/lnr`
    ///
    /// Individual files and the cache root can be relocated on their own.
    pub fn resolve(env: &Environment) -> Result<Self> {
        let config_dir = match (&env.config_dir, &env.xdg_config_home, &env.home) {
            (Some(dir), _, _) => dir.clone(),
            (None, Some(xdg), _) => xdg.join(APP_DIR),
            (None, None, Some(home)) => home.join(".config").join(APP_DIR),
            (None, None, None) => return Err(LnrError::HomeNotFound),
        };
        Ok(Paths {
            credentials_file: env
                .credentials_file
                .clone()
                .unwrap_or_else(|| config_dir.join(CREDENTIALS_FILE)),
            settings_file: env
                .config_file
                .clone()
                .unwrap_or_else(|| config_dir.join(CONFIG_FILE)),
            cache_dir: env
                .cache_dir
                .clone()
                .unwrap_or_else(|| config_dir.join(CACHE_DIR)),
            config_dir,
        })
    }

    /// Everything under one directory, with default file names.
    pub fn in_dir(dir: &Path) -> Self {
        Paths {
            config_dir: dir.to_path_buf(),
            credentials_file: dir.join(CREDENTIALS_FILE),
            settings_file: dir.join(CONFIG_FILE),
            cache_dir: dir.join(CACHE_DIR),
        }
    }
}

pub fn profile_cache_dir(cache_root: &Path, profile: &str) -> PathBuf {
    cache_root.join(profile)
}

pub fn cache_entry_path(cache_root: &Path, profile: &str, key: &str) -> PathBuf {
    profile_cache_dir(cache_root, profile).join(format!("{key}.{CACHE_EXT}"))
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static PROFILE_RE: OnceLock<Regex> = OnceLock::new();
static CACHE_KEY_RE: OnceLock<Regex> = OnceLock::new();

fn profile_re() -> &'static Regex {
    PROFILE_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]{0,63}$").unwrap())
}

fn cache_key_re() -> &'static Regex {
    CACHE_KEY_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_\-]*(\.[a-z0-9_\-]+)*$").unwrap())
}

/// Profile names double as directory names, so they must never contain a
/// path separator or dot segment.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if !profile_re().is_match(name) {
        return Err(LnrError::InvalidProfileName(name.to_string()));
    }
    Ok(())
}

pub fn validate_cache_key(key: &str) -> Result<()> {
    if key.len() > 128 || !cache_key_re().is_match(key) {
        return Err(LnrError::InvalidCacheKey(key.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_profile_names() {
        for name in ["default", "work", "Client_A", "x", "ci-bot-2"] {
            validate_profile_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_profile_names() {
        for name in ["", "..", ".", "a/b", "-lead", "_lead", "has space", "a\\b", "profile work"] {
            assert!(
                validate_profile_name(name).is_err(),
                "expected invalid: {name:?}"
            );
        }
        assert!(validate_profile_name(&"a".repeat(65)).is_err());
    }

    #[test]
    fn cache_keys() {
        for key in ["teams", "users", "states.eng", "labels_v2"] {
            validate_cache_key(key).unwrap_or_else(|_| panic!("expected valid: {key}"));
        }
        for key in ["", "..", "../teams", "a/b", "Teams", ".hidden", "a..b"] {
            assert!(validate_cache_key(key).is_err(), "expected invalid: {key:?}");
        }
    }

    #[test]
    fn explicit_config_dir_wins() {
        let env = Environment {
            config_dir: Some(PathBuf::from("/etc/lnr")),
            xdg_config_home: Some(PathBuf::from("/xdg")),
            home: Some(PathBuf::from("/home/u")),
            ..Default::default()
        };
        let paths = Paths::resolve(&env).unwrap();
        assert_eq!(paths, Paths::in_dir(Path::new("/etc/lnr")));
    }

    #[test]
    fn xdg_then_home() {
        let env = Environment {
            xdg_config_home: Some(PathBuf::from("/xdg")),
            home: Some(PathBuf::from("/home/u")),
            ..Default::default()
        };
        assert_eq!(
            Paths::resolve(&env).unwrap().config_dir,
            PathBuf::from("/xdg/lnr")
        );

        let env = Environment {
            home: Some(PathBuf::from("/home/u")),
            ..Default::default()
        };
        assert_eq!(
            Paths::resolve(&env).unwrap().settings_file,
            PathBuf::from("/home/u/.config/lnr/config")
        );
    }

    #[test]
    fn individual_files_can_be_relocated() {
        let env = Environment {
            config_dir: Some(PathBuf::from("/cfg")),
            credentials_file: Some(PathBuf::from("/secure/creds")),
            cache_dir: Some(PathBuf::from("/tmp/lnr-cache")),
            ..Default::default()
        };
        let paths = Paths::resolve(&env).unwrap();
        assert_eq!(paths.credentials_file, PathBuf::from("/secure/creds"));
        assert_eq!(paths.settings_file, PathBuf::from("/cfg/config"));
        assert_eq!(paths.cache_dir, PathBuf::from("/tmp/lnr-cache"));
    }

    #[test]
    fn no_home_is_an_error() {
        let err = Paths::resolve(&Environment::default()).unwrap_err();
        assert!(matches!(err, LnrError::HomeNotFound));
    }

    #[test]
    fn cache_paths_are_profile_scoped() {
        let root = Path::new("/c");
        assert_eq!(
            cache_entry_path(root, "work", "teams"),
            PathBuf::from("/c/work/teams.json")
        );
        assert_ne!(
            cache_entry_path(root, "work", "teams"),
            cache_entry_path(root, "home", "teams")
        );
    }
}
