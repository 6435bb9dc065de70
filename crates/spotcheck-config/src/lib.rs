//! Facet types for the spotcheck configuration schema.
//!
//! The CLI reads these from `.config/spotcheck.styx`. Every field is optional;
//! accessors fill in the defaults used by the SpotifyClone exercise.

use facet::Facet;

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Schema the submission dump is imported into.
pub const DEFAULT_SCHEMA: &str = "SpotifyClone";

/// Top-level configuration.
#[derive(Facet, Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// How to reach the database.
    #[facet(default)]
    pub database: DatabaseConfig,

    /// Where the submission files live.
    #[facet(default)]
    pub submission: SubmissionConfig,
}

/// Connection settings.
#[derive(Facet, Debug, Clone, Default, PartialEq)]
pub struct DatabaseConfig {
    #[facet(default)]
    pub user: Option<String>,

    #[facet(default)]
    pub password: Option<String>,

    #[facet(default)]
    pub host: Option<String>,

    #[facet(default)]
    pub port: Option<u16>,

    /// Database to connect to. The dump is loaded into a schema inside it.
    #[facet(default)]
    pub dbname: Option<String>,

    /// Schema that is dropped, recreated and filled from the dump.
    #[facet(default)]
    pub schema: Option<String>,
}

impl DatabaseConfig {
    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or("postgres")
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("localhost")
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn dbname(&self) -> &str {
        self.dbname.as_deref().unwrap_or("postgres")
    }

    pub fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }

    /// Apply `PG*` environment overrides on top of the file values.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`. An unparseable
    /// `PGPORT` is ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(user) = lookup("PGUSER") {
            self.user = Some(user);
        }
        if let Some(password) = lookup("PGPASSWORD") {
            self.password = Some(password);
        }
        if let Some(host) = lookup("PGHOST") {
            self.host = Some(host);
        }
        if let Some(port) = lookup("PGPORT").and_then(|p| p.parse().ok()) {
            self.port = Some(port);
        }
        if let Some(dbname) = lookup("PGDATABASE") {
            self.dbname = Some(dbname);
        }
        if let Some(schema) = lookup("SPOTCHECK_SCHEMA") {
            self.schema = Some(schema);
        }
        self
    }
}

/// Location of the submission files.
#[derive(Facet, Debug, Clone, Default, PartialEq)]
pub struct SubmissionConfig {
    /// Directory holding the dump, the role mapping and the scripts.
    #[facet(default)]
    pub dir: Option<String>,

    /// Dump file name, relative to `dir`.
    #[facet(default)]
    pub dump: Option<String>,

    /// Role mapping file name, relative to `dir`.
    #[facet(default)]
    pub roles: Option<String>,
}

impl SubmissionConfig {
    pub fn dir(&self) -> &str {
        self.dir.as_deref().unwrap_or(".")
    }

    pub fn dump(&self) -> &str {
        self.dump.as_deref().unwrap_or("desafio1.sql")
    }

    pub fn roles(&self) -> &str {
        self.roles.as_deref().unwrap_or("desafio1.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_exercise() {
        let config = Config::default();
        assert_eq!(config.database.port(), 5432);
        assert_eq!(config.database.schema(), "SpotifyClone");
        assert_eq!(config.database.user(), "postgres");
        assert_eq!(config.submission.dump(), "desafio1.sql");
        assert_eq!(config.submission.roles(), "desafio1.json");
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("PGUSER", "grader"),
            ("PGPASSWORD", "secret"),
            ("PGPORT", "6543"),
            ("SPOTCHECK_SCHEMA", "other"),
        ]
        .into_iter()
        .collect();

        let database = DatabaseConfig {
            user: Some("from_file".to_string()),
            host: Some("db".to_string()),
            ..Default::default()
        }
        .with_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(database.user(), "grader");
        assert_eq!(database.password(), Some("secret"));
        assert_eq!(database.host(), "db");
        assert_eq!(database.port(), 6543);
        assert_eq!(database.schema(), "other");
    }

    #[test]
    fn bad_port_is_ignored() {
        let database = DatabaseConfig {
            port: Some(5433),
            ..Default::default()
        }
        .with_env_overrides(|k| (k == "PGPORT").then(|| "not-a-port".to_string()));

        assert_eq!(database.port(), 5433);
    }
}
