//! Configuration file handling for spotcheck.
//!
//! Looks for `.config/spotcheck.styx` in the current directory or any parent
//! directory. Without one, defaults apply. `PG*` environment variables (also
//! read from `.env`) override the file.

pub use spotcheck_config::Config;

use camino::{Utf8Path, Utf8PathBuf};

const CONFIG_FILE: &str = ".config/spotcheck.styx";

/// Load configuration, searching up from the current directory.
pub fn load() -> Result<(Config, Option<Utf8PathBuf>), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    let cwd = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|p| ConfigError::Io(format!("non UTF-8 working directory: {}", p.display())))?;

    let _ = dotenvy::dotenv();
    let (config, path) = load_from(&cwd)?;
    let config = Config {
        database: config
            .database
            .with_env_overrides(|k| std::env::var(k).ok()),
        ..config
    };
    Ok((config, path))
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Utf8Path) -> Result<(Config, Option<Utf8PathBuf>), ConfigError> {
    let Some(config_path) = find_config_file(start) else {
        return Ok((Config::default(), None));
    };
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;

    let config: Config =
        facet_styx::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok((config, Some(config_path)))
}

/// Find `.config/spotcheck.styx` by searching up the directory tree.
fn find_config_file(start: &Utf8Path) -> Option<Utf8PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|path| path.exists())
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading the file
    Io(String),
    /// Parse error in the Styx file
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read {CONFIG_FILE}: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse {CONFIG_FILE}: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
