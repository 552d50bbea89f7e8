//! Named profiles backed by two INI files.
//!
//! Layout:
//!   credentials   [work]            api_key = ...     (0600)
//!   config        [default]         team = ENG        (0644)
//!                 [profile work]    page_size = 25
//!
//! The secrets file keys sections by bare profile name; the settings file
//! uses the bare name only for `default` and `profile <name>` otherwise.

use crate::credentials::CredentialStore;
use crate::duration::{format_duration, parse_duration};
use crate::error::{LnrError, Result};
use crate::ini::{IniDocument, Section};
use crate::io;
use crate::paths::{self, Paths};
use crate::secret::Secret;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 250;

const API_KEY: &str = "api_key";
const WORKSPACE: &str = "workspace";
const TEAM: &str = "team";
const OUTPUT: &str = "output";
const CACHE_TTL: &str = "cache_ttl";
const PAGE_SIZE: &str = "page_size";

/// Keys `lnr profile set` accepts. `workspace` is owned by the login flow.
pub const SETTABLE_KEYS: &[&str] = &[TEAM, OUTPUT, CACHE_TTL, PAGE_SIZE];

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = LnrError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(LnrError::InvalidSetting {
                key: OUTPUT.to_string(),
                reason: format!("'{s}': expected table or json"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: String,
    /// Informational; written after a successful login.
    pub workspace: Option<String>,
    pub team: Option<String>,
    pub output: Option<OutputFormat>,
    #[serde(serialize_with = "serialize_ttl")]
    pub cache_ttl: Option<Duration>,
    pub page_size: Option<u32>,
}

fn serialize_ttl<S: serde::Serializer>(
    ttl: &Option<Duration>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    match ttl {
        Some(d) => s.serialize_some(&format_duration(*d)),
        None => s.serialize_none(),
    }
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Profile {
            name: name.into(),
            workspace: None,
            team: None,
            output: None,
            cache_ttl: None,
            page_size: None,
        }
    }

    pub fn cache_ttl_or_default(&self) -> Duration {
        self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL)
    }

    pub fn page_size_or_default(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn output_or_default(&self) -> OutputFormat {
        self.output.unwrap_or_default()
    }

    /// Validate and apply one settable key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            TEAM => {
                let team = value.trim();
                if team.chars().any(char::is_control) {
                    return Err(LnrError::InvalidSetting {
                        key: TEAM.to_string(),
                        reason: format!("'{}': control characters are not allowed", team.escape_debug()),
                    });
                }
                self.team = Some(team.to_string()).filter(|t| !t.is_empty());
            }
            OUTPUT => self.output = Some(value.trim().parse()?),
            CACHE_TTL => self.cache_ttl = Some(parse_duration(value)?),
            PAGE_SIZE => self.page_size = Some(parse_page_size(value)?),
            _ => return Err(LnrError::UnknownSetting(key.to_string())),
        }
        Ok(())
    }

    pub fn unset(&mut self, key: &str) -> Result<()> {
        match key {
            TEAM => self.team = None,
            OUTPUT => self.output = None,
            CACHE_TTL => self.cache_ttl = None,
            PAGE_SIZE => self.page_size = None,
            _ => return Err(LnrError::UnknownSetting(key.to_string())),
        }
        Ok(())
    }

    fn from_section(name: &str, section: &Section) -> Result<Self> {
        let mut profile = Profile::new(name);
        profile.workspace = section.get(WORKSPACE).map(str::to_string);
        for key in SETTABLE_KEYS {
            if let Some(value) = section.get(key) {
                profile.set(key, value)?;
            }
        }
        Ok(profile)
    }

    fn to_section(&self) -> Section {
        let mut section = Section::new(settings_section_name(&self.name));
        if let Some(ws) = &self.workspace {
            section.set(WORKSPACE, ws);
        }
        if let Some(team) = &self.team {
            section.set(TEAM, team);
        }
        if let Some(output) = self.output {
            section.set(OUTPUT, &output.to_string());
        }
        if let Some(ttl) = self.cache_ttl {
            section.set(CACHE_TTL, &format_duration(ttl));
        }
        if let Some(size) = self.page_size {
            section.set(PAGE_SIZE, &size.to_string());
        }
        section
    }
}

fn parse_page_size(value: &str) -> Result<u32> {
    let invalid = || LnrError::InvalidSetting {
        key: PAGE_SIZE.to_string(),
        reason: format!("'{value}': expected an integer between 1 and {MAX_PAGE_SIZE}"),
    };
    let n: u32 = value.trim().parse().map_err(|_| invalid())?;
    if n == 0 || n > MAX_PAGE_SIZE {
        return Err(invalid());
    }
    Ok(n)
}

/// `default` stays bare; every other profile is `profile <name>`.
pub fn settings_section_name(profile: &str) -> String {
    if profile == DEFAULT_PROFILE {
        DEFAULT_PROFILE.to_string()
    } else {
        format!("profile {profile}")
    }
}

/// Inverse of [`settings_section_name`]. Unrecognised sections yield `None`.
pub fn profile_from_settings_section(section: &str) -> Option<&str> {
    if section == DEFAULT_PROFILE {
        return Some(DEFAULT_PROFILE);
    }
    section
        .strip_prefix("profile ")
        .map(str::trim)
        .filter(|n| !n.is_empty())
}

// ---------------------------------------------------------------------------
// ProfileStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    pub workspace: Option<String>,
}

/// Reads and rewrites the secrets and settings files.
///
/// Every write is load → mutate → atomic rename of the whole file. There is
/// no locking: two processes writing the same file concurrently resolve as
/// last-writer-wins.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    credentials_path: PathBuf,
    settings_path: PathBuf,
}

impl ProfileStore {
    pub fn new(credentials_path: impl Into<PathBuf>, settings_path: impl Into<PathBuf>) -> Self {
        ProfileStore {
            credentials_path: credentials_path.into(),
            settings_path: settings_path.into(),
        }
    }

    pub fn from_paths(paths: &Paths) -> Self {
        Self::new(&paths.credentials_file, &paths.settings_file)
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Settings for `name`, with every field unset when the profile has no
    /// section yet.
    pub fn load(&self, name: &str) -> Result<Profile> {
        paths::validate_profile_name(name)?;
        let doc = read_document(&self.settings_path)?;
        match doc.section(&settings_section_name(name)) {
            Some(section) => Profile::from_section(name, section).map_err(|e| match e {
                LnrError::InvalidSetting { key, reason } => LnrError::InvalidSetting {
                    key: format!("{key} (in {})", self.settings_path.display()),
                    reason,
                },
                other => other,
            }),
            None => Ok(Profile::new(name)),
        }
    }

    pub fn save(&self, profile: &Profile) -> Result<()> {
        paths::validate_profile_name(&profile.name)?;
        let mut doc = read_document(&self.settings_path)?;
        doc.replace_section(profile.to_section());
        io::atomic_write(
            &self.settings_path,
            render_document(&doc, &self.settings_path)?.as_bytes(),
            io::SHARED_FILE_MODE,
        )?;
        io::reassert_mode(&self.credentials_path, io::PRIVATE_FILE_MODE)?;
        tracing::debug!(profile = %profile.name, path = %self.settings_path.display(), "saved profile settings");
        Ok(())
    }

    /// Remove the profile from both files. Absent profiles are a no-op.
    pub fn delete(&self, name: &str) -> Result<()> {
        paths::validate_profile_name(name)?;
        let mut creds = read_document(&self.credentials_path)?;
        if creds.remove_section(name) {
            io::atomic_write(
                &self.credentials_path,
                render_document(&creds, &self.credentials_path)?.as_bytes(),
                io::PRIVATE_FILE_MODE,
            )?;
        }
        let mut settings = read_document(&self.settings_path)?;
        if settings.remove_section(&settings_section_name(name)) {
            io::atomic_write(
                &self.settings_path,
                render_document(&settings, &self.settings_path)?.as_bytes(),
                io::SHARED_FILE_MODE,
            )?;
        }
        io::reassert_mode(&self.credentials_path, io::PRIVATE_FILE_MODE)?;
        tracing::debug!(profile = %name, "deleted profile");
        Ok(())
    }

    /// Whether either file has a section for `name`.
    pub fn exists(&self, name: &str) -> Result<bool> {
        let creds = read_document(&self.credentials_path)?;
        if creds.section(name).is_some() {
            return Ok(true);
        }
        let settings = read_document(&self.settings_path)?;
        Ok(settings.section(&settings_section_name(name)).is_some())
    }

    /// Every profile found in either file, `default` first, then by name.
    pub fn list(&self) -> Result<Vec<ProfileSummary>> {
        let creds = read_document(&self.credentials_path)?;
        let settings = read_document(&self.settings_path)?;

        let mut names: Vec<String> = creds.sections().map(|s| s.name.clone()).collect();
        for section in settings.sections() {
            match profile_from_settings_section(&section.name) {
                Some(name) => names.push(name.to_string()),
                None => tracing::warn!(section = %section.name, "ignoring unrecognised settings section"),
            }
        }
        names.retain(|n| paths::validate_profile_name(n).is_ok());
        names.sort_by(|a, b| {
            (a != DEFAULT_PROFILE)
                .cmp(&(b != DEFAULT_PROFILE))
                .then_with(|| a.cmp(b))
        });
        names.dedup();

        Ok(names
            .into_iter()
            .map(|name| {
                let workspace = settings
                    .section(&settings_section_name(&name))
                    .and_then(|s| s.get(WORKSPACE))
                    .map(str::to_string);
                ProfileSummary { name, workspace }
            })
            .collect())
    }

    pub fn set_credential(&self, name: &str, secret: &Secret) -> Result<()> {
        paths::validate_profile_name(name)?;
        let mut doc = read_document(&self.credentials_path)?;
        doc.section_mut(name).set(API_KEY, secret.expose());
        io::atomic_write(
            &self.credentials_path,
            render_document(&doc, &self.credentials_path)?.as_bytes(),
            io::PRIVATE_FILE_MODE,
        )?;
        io::reassert_mode(&self.settings_path, io::SHARED_FILE_MODE)?;
        tracing::debug!(profile = %name, "stored credential");
        Ok(())
    }
}

impl CredentialStore for ProfileStore {
    fn credential(&self, profile: &str) -> Result<Option<Secret>> {
        let doc = read_document(&self.credentials_path)?;
        Ok(doc
            .section(profile)
            .and_then(|s| s.get(API_KEY))
            .and_then(Secret::new))
    }
}

fn read_document(path: &Path) -> Result<IniDocument> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(IniDocument::default()),
        Err(e) => return Err(e.into()),
    };
    IniDocument::parse(&content).map_err(|source| LnrError::Config {
        path: path.to_path_buf(),
        source,
    })
}

fn render_document(doc: &IniDocument, path: &Path) -> Result<String> {
    doc.render().map_err(|source| LnrError::Unwritable {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (ProfileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::from_paths(&Paths::in_dir(dir.path()));
        (store, dir)
    }

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    fn secret(s: &str) -> Secret {
        Secret::new(s).unwrap()
    }

    #[test]
    fn load_missing_profile_has_defaults() {
        let (store, _dir) = store();
        let profile = store.load("work").unwrap();
        assert_eq!(profile, Profile::new("work"));
        assert_eq!(profile.cache_ttl_or_default(), DEFAULT_CACHE_TTL);
        assert_eq!(profile.page_size_or_default(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (store, _dir) = store();
        let mut profile = Profile::new("work");
        profile.workspace = Some("Acme Corp".into());
        profile.set("team", "ENG").unwrap();
        profile.set("output", "json").unwrap();
        profile.set("cache_ttl", "1h30m").unwrap();
        profile.set("page_size", "25").unwrap();
        store.save(&profile).unwrap();
        assert_eq!(store.load("work").unwrap(), profile);
    }

    #[test]
    fn settings_sections_follow_naming_convention() {
        let (store, _dir) = store();
        let mut default = Profile::new(DEFAULT_PROFILE);
        default.team = Some("OPS".into());
        let mut work = Profile::new("work");
        work.team = Some("ENG".into());
        store.save(&default).unwrap();
        store.save(&work).unwrap();

        let content = std::fs::read_to_string(store.settings_path()).unwrap();
        assert!(content.contains("[default]\n"));
        assert!(content.contains("[profile work]\n"));
        assert!(!content.contains("[work]"));
    }

    #[test]
    fn credentials_sections_use_bare_names() {
        let (store, _dir) = store();
        store.set_credential("work", &secret("key-work")).unwrap();
        let content = std::fs::read_to_string(store.credentials_path()).unwrap();
        assert_eq!(content, "[work]\napi_key = key-work\n");
    }

    #[test]
    fn credential_never_lands_in_settings_file() {
        let (store, _dir) = store();
        store.set_credential("work", &secret("lin_api_supersecretvalue")).unwrap();
        let mut profile = Profile::new("work");
        profile.workspace = Some("Acme".into());
        store.save(&profile).unwrap();
        let settings = std::fs::read_to_string(store.settings_path()).unwrap();
        assert!(!settings.contains("supersecret"));
    }

    #[cfg(unix)]
    #[test]
    fn save_reasserts_secret_file_permissions() {
        let (store, _dir) = store();
        store.set_credential("work", &secret("key-work")).unwrap();
        io::set_mode(store.credentials_path(), 0o644).unwrap();

        store.save(&Profile::new("work")).unwrap();

        assert_eq!(mode_of(store.credentials_path()), 0o600);
        assert_eq!(mode_of(store.settings_path()), 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn set_credential_heals_permissions() {
        let (store, _dir) = store();
        store.set_credential("work", &secret("one")).unwrap();
        io::set_mode(store.credentials_path(), 0o666).unwrap();
        store.set_credential("work", &secret("two")).unwrap();
        assert_eq!(mode_of(store.credentials_path()), 0o600);
    }

    #[test]
    fn credential_lookup() {
        let (store, _dir) = store();
        assert!(store.credential("work").unwrap().is_none());
        store.set_credential("work", &secret("key-work")).unwrap();
        store.set_credential("home", &secret("key-home")).unwrap();
        assert_eq!(store.credential("work").unwrap().unwrap().expose(), "key-work");
        assert_eq!(store.credential("home").unwrap().unwrap().expose(), "key-home");
    }

    #[test]
    fn blank_credential_is_absent() {
        let (store, _dir) = store();
        std::fs::write(store.credentials_path(), "[work]\napi_key =\n").unwrap();
        assert!(store.credential("work").unwrap().is_none());
    }

    #[test]
    fn delete_removes_both_sections_and_keeps_others() {
        let (store, _dir) = store();
        store.set_credential("work", &secret("key-work")).unwrap();
        store.set_credential("home", &secret("key-home")).unwrap();
        store.save(&Profile::new("work")).unwrap();

        store.delete("work").unwrap();

        assert!(!store.exists("work").unwrap());
        assert!(store.exists("home").unwrap());
        assert!(store.credential("work").unwrap().is_none());
    }

    #[test]
    fn delete_missing_is_noop() {
        let (store, _dir) = store();
        store.delete("ghost").unwrap();
        assert!(!store.credentials_path().exists());
    }

    #[test]
    fn list_unions_files_default_first() {
        let (store, _dir) = store();
        store.set_credential("zeta", &secret("z")).unwrap();
        store.set_credential(DEFAULT_PROFILE, &secret("d")).unwrap();
        let mut alpha = Profile::new("alpha");
        alpha.workspace = Some("Alpha Inc".into());
        store.save(&alpha).unwrap();
        store.save(&Profile::new("zeta")).unwrap();

        let list = store.list().unwrap();
        let names: Vec<_> = list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["default", "alpha", "zeta"]);
        assert_eq!(list[1].workspace.as_deref(), Some("Alpha Inc"));
    }

    #[test]
    fn malformed_settings_file_is_a_config_error() {
        let (store, _dir) = store();
        std::fs::write(store.settings_path(), "[default\n").unwrap();
        let err = store.load(DEFAULT_PROFILE).unwrap_err();
        assert!(matches!(err, LnrError::Config { .. }));
    }

    #[test]
    fn invalid_stored_value_names_the_key() {
        let (store, _dir) = store();
        std::fs::write(store.settings_path(), "[profile work]\npage_size = 0\n").unwrap();
        let err = store.load("work").unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn invalid_profile_name_rejected() {
        let (store, _dir) = store();
        assert!(matches!(
            store.load("../etc"),
            Err(LnrError::InvalidProfileName(_))
        ));
    }

    #[test]
    fn profile_set_validates() {
        let mut p = Profile::new("work");
        assert!(p.set("page_size", "0").is_err());
        assert!(p.set("page_size", "251").is_err());
        assert!(p.set("output", "csv").is_err());
        assert!(p.set("cache_ttl", "soon").is_err());
        assert!(matches!(
            p.set("workspace", "x"),
            Err(LnrError::UnknownSetting(_))
        ));
        p.set("cache_ttl", "0").unwrap();
        assert_eq!(p.cache_ttl_or_default(), Duration::ZERO);
        p.unset("cache_ttl").unwrap();
        assert_eq!(p.cache_ttl_or_default(), DEFAULT_CACHE_TTL);
    }

    #[test]
    fn team_with_embedded_newline_rejected() {
        let mut p = Profile::new("work");
        let err = p.set("team", "ENG\njunk").unwrap_err();
        assert!(matches!(err, LnrError::InvalidSetting { .. }));
        assert_eq!(p.team, None);
        p.set("team", "  ENG  ").unwrap();
        assert_eq!(p.team.as_deref(), Some("ENG"));
    }

    #[test]
    fn unsafe_workspace_name_is_not_written() {
        let (store, _dir) = store();
        let mut work = Profile::new("work");
        work.team = Some("ENG".into());
        store.save(&work).unwrap();
        let before = std::fs::read_to_string(store.settings_path()).unwrap();

        work.workspace = Some("Acme\n[evil]\napi_key = x".into());
        let err = store.save(&work).unwrap_err();
        assert!(matches!(err, LnrError::Unwritable { .. }));
        assert_eq!(std::fs::read_to_string(store.settings_path()).unwrap(), before);
        assert_eq!(store.load("work").unwrap().team.as_deref(), Some("ENG"));
    }

    #[test]
    fn section_name_inverse() {
        assert_eq!(profile_from_settings_section("default"), Some("default"));
        assert_eq!(profile_from_settings_section("profile work"), Some("work"));
        assert_eq!(profile_from_settings_section("work"), None);
        assert_eq!(profile_from_settings_section("profile "), None);
    }
}
