//! Dialect selection.
//!
//! A [`DialectConfig`] names a backend and, for SQLite, the version whose
//! feature set should be assumed. It can be parsed from a short tag such as
//! `postgresql` or `sqlite3@3.35.0`, or deserialized from any serde format:
//!
//! ```rust
//! use sqlforge_core::config::DialectConfig;
//!
//! let config: DialectConfig = "sqlite3@3.35.0".parse()?;
//! let dialect = config.build()?;
//! assert_eq!(dialect.name(), "sqlite3");
//! # Ok::<(), sqlforge_core::Error>(())
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dialect::{Dialect, Generic, MySql, Postgres, Sqlite, Version};
use crate::error::ConfigError;

/// Supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Generic,
    Mysql,
    #[serde(alias = "postgres")]
    Postgresql,
    #[serde(alias = "sqlite")]
    Sqlite3,
}

impl Backend {
    /// The canonical tag of the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Mysql => "mysql",
            Self::Postgresql => "postgresql",
            Self::Sqlite3 => "sqlite3",
        }
    }

    const fn is_versioned(self) -> bool {
        matches!(self, Self::Sqlite3)
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(Self::Generic),
            "mysql" => Ok(Self::Mysql),
            "postgresql" | "postgres" => Ok(Self::Postgresql),
            "sqlite3" | "sqlite" => Ok(Self::Sqlite3),
            _ => Err(ConfigError::UnknownDialect(String::from(s))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which dialect to render for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DialectConfig {
    pub backend: Backend,
    /// Only meaningful for SQLite. Without it the newest feature set is assumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl DialectConfig {
    #[must_use]
    pub const fn new(backend: Backend) -> Self {
        Self {
            backend,
            version: None,
        }
    }

    #[must_use]
    pub const fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Instantiates the configured dialect.
    ///
    /// # Errors
    ///
    /// Fails if a version is given for a backend that does not take one.
    pub fn build(&self) -> Result<Box<dyn Dialect>, ConfigError> {
        if self.version.is_some() && !self.backend.is_versioned() {
            return Err(ConfigError::UnexpectedVersion(String::from(
                self.backend.as_str(),
            )));
        }
        let dialect: Box<dyn Dialect> = match self.backend {
            Backend::Generic => Box::new(Generic),
            Backend::Mysql => Box::new(MySql),
            Backend::Postgresql => Box::new(Postgres),
            Backend::Sqlite3 => Box::new(self.version.map_or_else(Sqlite::latest, Sqlite::new)),
        };
        Ok(dialect)
    }
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self::new(Backend::Generic)
    }
}

impl FromStr for DialectConfig {
    type Err = ConfigError;

    /// Parses `backend` or `backend@MAJOR.MINOR.PATCH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (backend, version) = match s.split_once('@') {
            Some((backend, version)) => (backend, Some(version.trim().parse::<Version>()?)),
            None => (s, None),
        };
        let backend: Backend = backend.parse()?;
        if version.is_some() && !backend.is_versioned() {
            return Err(ConfigError::UnexpectedVersion(String::from(backend.as_str())));
        }
        Ok(Self { backend, version })
    }
}

impl fmt::Display for DialectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}@{version}", self.backend),
            None => write!(f, "{}", self.backend),
        }
    }
}
