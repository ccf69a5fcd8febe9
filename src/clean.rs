//! Clears stale output from the publish directory before a build writes
//! anything. Everything the generator produces is regenerated on every run,
//! so any plain file left over from a previous run is removed, with two
//! exceptions: the [`RESERVED_FILES`], which are managed by hand, and hidden
//! files. Subdirectories are never entered or removed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Files in the publish directory that a rebuild must never delete.
pub const RESERVED_FILES: &[&str] = &[
    "favicon.ico",
    "robots.txt",
    "humans.txt",
    "apple-touch-icon.png",
];

/// Removes every non-hidden, non-reserved plain file directly inside `dir`.
/// The directory is created if it doesn't exist yet. Returns the number of
/// files removed.
pub fn clear_publish_dir(dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir).map_err(|err| Error::Read {
        path: dir.to_owned(),
        err,
    })?;
    let entries = fs::read_dir(dir).map_err(|err| Error::Read {
        path: dir.to_owned(),
        err,
    })?;

    let mut removed = 0;
    for result in entries {
        let entry = result.map_err(|err| Error::Read {
            path: dir.to_owned(),
            err,
        })?;
        let file_type = entry.file_type().map_err(|err| Error::Read {
            path: entry.path(),
            err,
        })?;
        if file_type.is_dir() || is_preserved(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let path = entry.path();
        fs::remove_file(&path).map_err(|err| Error::Delete {
            path: path.clone(),
            err,
        })?;
        debug!("removed {}", path.display());
        removed += 1;
    }
    Ok(removed)
}

fn is_preserved(file_name: &str) -> bool {
    file_name.starts_with('.') || RESERVED_FILES.contains(&file_name)
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to clear the publish directory. Both variants are
/// fatal to the build.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the publish directory can't be created or listed.
    #[error("Reading publish directory '{}': {}", path.display(), err)]
    Read { path: PathBuf, err: io::Error },

    /// Returned when a stale file can't be removed.
    #[error("Deleting file '{}': {}", path.display(), err)]
    Delete { path: PathBuf, err: io::Error },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clear_publish_dir() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let keep = [
            "favicon.ico",
            "robots.txt",
            "humans.txt",
            "apple-touch-icon.png",
            ".htaccess",
            ".well-known-token",
        ];
        let remove = ["index.html", "rss.xml", "old-post", "notes.txt"];
        for name in keep.iter().chain(remove.iter()) {
            fs::write(dir.path().join(name), format!("contents of {}", name))?;
        }
        fs::create_dir(dir.path().join("images"))?;
        fs::write(dir.path().join("images").join("cat.png"), "meow")?;

        assert_eq!(remove.len(), clear_publish_dir(dir.path())?);

        for name in keep.iter() {
            assert_eq!(
                format!("contents of {}", name),
                fs::read_to_string(dir.path().join(name))?
            );
        }
        for name in remove.iter() {
            assert!(!dir.path().join(name).exists(), "{} should be gone", name);
        }
        assert_eq!("meow", fs::read_to_string(dir.path().join("images").join("cat.png"))?);
        Ok(())
    }

    #[test]
    fn test_clear_publish_dir_creates_missing_dir() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("public");
        assert_eq!(0, clear_publish_dir(&dir)?);
        assert!(dir.is_dir());
        Ok(())
    }

    #[test]
    fn test_clear_publish_dir_not_a_directory() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        let file = root.path().join("public");
        fs::write(&file, "")?;
        assert!(matches!(clear_publish_dir(&file), Err(Error::Read { .. })));
        Ok(())
    }
}
