// ABOUTME: Declaration-file discovery for a single project directory
// ABOUTME: Checks exactly the given directory, never parent directories

use direnvoy_logging::trace;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ImportError;

/// Declaration file names recognized in a project directory, in preference
/// order. direnv evaluates `.envrc` and falls back to `.env`.
pub const DECLARATION_FILES: [&str; 2] = [".envrc", ".env"];

/// A declaration file that exists on disk, resolved fresh per import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvFile {
    /// Absolute path of the declaration file
    pub path: PathBuf,
    /// Directory the file belongs to; the tool's working directory
    pub dir: PathBuf,
}

/// Finds the declaration file for a directory.
///
/// Scope is exactly the given directory. Upward search is deliberately not
/// performed so each project's environment stays predictable.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvrcLocator;

impl EnvrcLocator {
    pub fn locate(&self, dir: &Path) -> Result<Option<EnvFile>, ImportError> {
        for name in DECLARATION_FILES {
            let candidate = dir.join(name);
            match candidate.metadata() {
                Ok(meta) if meta.is_file() => {
                    trace!(path = %candidate.display(), "found declaration file");
                    return Ok(Some(EnvFile {
                        path: candidate,
                        dir: dir.to_path_buf(),
                    }));
                }
                // A directory named .envrc does not count
                Ok(_) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(ImportError::io(candidate, &err)),
            }
        }

        trace!(dir = %dir.display(), "directory contains no declaration file");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_empty_directory_yields_none() {
        let dir = tempdir().unwrap();
        let found = EnvrcLocator.locate(dir.path()).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_envrc_is_found() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".envrc"), "export FOO=bar\n").unwrap();

        let found = EnvrcLocator.locate(dir.path()).unwrap().unwrap();
        assert_eq!(found.path, dir.path().join(".envrc"));
        assert_eq!(found.dir, dir.path());
    }

    #[test]
    fn test_dotenv_is_a_fallback() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "FOO=bar\n").unwrap();

        let found = EnvrcLocator.locate(dir.path()).unwrap().unwrap();
        assert_eq!(found.path, dir.path().join(".env"));
    }

    #[test]
    fn test_envrc_wins_over_dotenv() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".envrc"), "export FOO=bar\n").unwrap();
        fs::write(dir.path().join(".env"), "FOO=other\n").unwrap();

        let found = EnvrcLocator.locate(dir.path()).unwrap().unwrap();
        assert_eq!(found.path, dir.path().join(".envrc"));
    }

    #[test]
    fn test_directory_named_envrc_is_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".envrc")).unwrap();

        let found = EnvrcLocator.locate(dir.path()).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_parent_directories_are_not_searched() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".envrc"), "export FOO=bar\n").unwrap();
        let child = dir.path().join("child");
        fs::create_dir(&child).unwrap();

        let found = EnvrcLocator.locate(&child).unwrap();
        assert_eq!(found, None);
    }
}
