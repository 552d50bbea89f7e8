use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Owner read/write only. Used for the secrets file.
pub const PRIVATE_FILE_MODE: u32 = 0o600;
/// Owner read/write, world-readable. Used for the settings file.
pub const SHARED_FILE_MODE: u32 = 0o644;
/// Owner-only directory. Used for per-profile cache directories.
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Atomically write `data` to `path` using a tempfile in the same directory.
///
/// The tempfile gets `mode` before it is renamed over `path`, so the target
/// never exists with weaker permissions than requested. The mode is applied
/// on every call, healing permissions that were loosened externally.
pub fn atomic_write(path: &Path, data: &[u8], mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    set_mode(tmp.path(), mode)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory (and parents) and force its permission bits to `mode`.
pub fn ensure_dir_with_mode(path: &Path, mode: u32) -> Result<()> {
    std::fs::create_dir_all(path)?;
    set_mode(path, mode)
}

/// Re-assert permission bits on an existing file. Missing files are left alone.
pub fn reassert_mode(path: &Path, mode: u32) -> Result<()> {
    if path.exists() {
        set_mode(path, mode)?;
    }
    Ok(())
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        atomic_write(&path, b"[default]\n", SHARED_FILE_MODE).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[default]\n");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/credentials");
        atomic_write(&path, b"data", PRIVATE_FILE_MODE).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        atomic_write(&path, b"a long original body", SHARED_FILE_MODE).unwrap();
        atomic_write(&path, b"short", SHARED_FILE_MODE).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_heals_loosened_permissions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials");
        atomic_write(&path, b"x", PRIVATE_FILE_MODE).unwrap();
        set_mode(&path, 0o666).unwrap();
        atomic_write(&path, b"y", PRIVATE_FILE_MODE).unwrap();
        assert_eq!(mode_of(&path), PRIVATE_FILE_MODE);
    }

    #[cfg(unix)]
    #[test]
    fn ensure_dir_with_mode_tightens_existing_dir() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("cache/work");
        std::fs::create_dir_all(&sub).unwrap();
        set_mode(&sub, 0o755).unwrap();
        ensure_dir_with_mode(&sub, PRIVATE_DIR_MODE).unwrap();
        assert_eq!(mode_of(&sub), PRIVATE_DIR_MODE);
    }

    #[test]
    fn remove_if_exists_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("teams.json");
        std::fs::write(&path, b"{}").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(!remove_if_exists(&path).unwrap());
    }

    #[test]
    fn reassert_mode_skips_missing_file() {
        let dir = TempDir::new().unwrap();
        reassert_mode(&dir.path().join("nope"), PRIVATE_FILE_MODE).unwrap();
    }
}
