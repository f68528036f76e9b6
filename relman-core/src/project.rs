use std::env;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name used for a project-local database
const LOCAL_DB_NAME: &str = "relman.db";

/// Environment variable overriding the database location
const DB_ENV_VAR: &str = "RELMAN_DB";

/// Determines the database path to use.
///
/// Priority: explicit command-line option, then the `RELMAN_DB`
/// environment variable, then a `relman.db` in the current directory,
/// then the per-user data directory.
pub fn determine_db_path(db_option: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = db_option {
        return Ok(path.to_path_buf());
    }

    if let Ok(env_path) = env::var(DB_ENV_VAR) {
        if !env_path.trim().is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }

    let local = PathBuf::from(LOCAL_DB_NAME);
    if local.exists() {
        return Ok(local);
    }

    let data_dir = dirs::data_dir().ok_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "could not determine the user data directory",
        ))
    })?;
    Ok(data_dir.join("relman").join(LOCAL_DB_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_option_wins() {
        let path = determine_db_path(Some(Path::new("/tmp/custom.db"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.db"));
    }
}
