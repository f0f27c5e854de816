//! Search-path lookup.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[cfg(windows)]
const EXTENSIONS: &[&str] = &["", ".exe", ".cmd", ".bat"];
#[cfg(not(windows))]
const EXTENSIONS: &[&str] = &[""];

/// Returns true when a file exists and has any execute bit set.
pub fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = std::fs::metadata(path) {
            return meta.permissions().mode() & 0o111 != 0;
        }
        false
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Find an executable by name in the directories of `search_path`
/// (formatted like `PATH`).
///
/// Names containing a path separator are never looked up; the probes only
/// ask for bare command names.
pub fn find_in(search_path: &OsStr, name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return None;
    }
    for dir in env::split_paths(search_path) {
        for ext in EXTENSIONS {
            let candidate = dir.join(format!("{name}{ext}"));
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Find an executable by name somewhere on `PATH`.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    find_in(&paths, name)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\necho ok\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn finds_executable_in_later_directory() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = touch(second.path(), "mytool", 0o755);

        let search = env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(find_in(&search, "mytool"), Some(expected));
    }

    #[test]
    fn skips_non_executable_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "plain", 0o644);

        let search = env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in(&search, "plain"), None);
    }

    #[test]
    fn ignores_names_with_separators() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "tool", 0o755);

        let search = env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in(&search, "./tool"), None);
        assert_eq!(find_in(&search, ""), None);
    }
}
