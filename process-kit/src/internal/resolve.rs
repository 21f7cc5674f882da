//! Executable resolution.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Turns an executable name or path into an absolute, executable path.
pub trait ExecutableResolver: Send + Sync {
    /// Return the path to run, or `None` if nothing executable matches.
    fn resolve(&self, name: &str) -> Option<PathBuf>;
}

/// Default resolver backed by the `which` crate.
///
/// Names containing a path separator are checked in place. Bare names are
/// looked up on `PATH`; hits are cached process-wide, misses never are.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPathResolver;

fn cache() -> MutexGuard<'static, HashMap<String, PathBuf>> {
    static CACHE: OnceLock<Mutex<HashMap<String, PathBuf>>> = OnceLock::new();
    CACHE
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

impl SearchPathResolver {
    /// Forget every cached lookup.
    pub fn clear_cache() {
        cache().clear();
    }

    /// Cached path for `name`, if a previous lookup found one.
    pub fn cached(name: &str) -> Option<PathBuf> {
        cache().get(name).cloned()
    }

    fn lookup(name: &str) -> Option<PathBuf> {
        let path = which::which(name).ok()?;
        if path.is_absolute() {
            Some(path)
        } else {
            std::env::current_dir().ok().map(|cwd| cwd.join(path))
        }
    }
}

impl ExecutableResolver for SearchPathResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        if name.contains('/') {
            return Self::lookup(name);
        }

        if let Some(path) = Self::cached(name) {
            return Some(path);
        }
        let path = Self::lookup(name)?;
        // Another caller may have raced us; keep whichever entry landed first.
        Some(cache().entry(name.to_string()).or_insert(path).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_resolve_bare_name_is_cached() {
        let resolved = SearchPathResolver.resolve("sh").expect("sh on PATH");
        assert!(resolved.is_absolute());
        assert_eq!(SearchPathResolver::cached("sh"), Some(resolved.clone()));
        assert_eq!(SearchPathResolver.resolve("sh"), Some(resolved));
    }

    #[test]
    fn test_resolve_absolute_path() {
        assert_eq!(SearchPathResolver.resolve("/bin/sh"), Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    fn test_missing_name_not_cached() {
        let name = "definitely-not-a-real-program-4f1c";
        assert_eq!(SearchPathResolver.resolve(name), None);
        assert_eq!(SearchPathResolver::cached(name), None);
        assert_eq!(SearchPathResolver.resolve(""), None);
    }

    #[test]
    fn test_non_executable_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.sh");
        fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(SearchPathResolver.resolve(script.to_str().unwrap()), None);

        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(SearchPathResolver.resolve(script.to_str().unwrap()), Some(script));
    }
}
