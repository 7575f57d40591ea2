use std::path::PathBuf;

use anyhow::Context;

use crate::models::SortSurface;
use crate::source::RosterSource;

pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: Option<String>,
    pub roster_file: Option<PathBuf>,
    pub sort_surface: SortSurface,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            roster_file: None,
            sort_surface: SortSurface::Standard,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut settings = Settings::default();

        if let Some(v) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            settings.database_url = Some(v);
        }
        if let Some(v) = lookup("ROSTER_FILE").filter(|v| !v.trim().is_empty()) {
            settings.roster_file = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ROSTER_SORT_SURFACE") {
            settings.sort_surface = v
                .parse()
                .context("ROSTER_SORT_SURFACE must be `standard` or `extended`")?;
        }
        if let Some(v) = lookup("ROSTER_LOG") {
            settings.log_filter = v;
        }

        Ok(settings)
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }

    /// A roster file (flag or `ROSTER_FILE`) wins over the database.
    pub fn roster_source(&self, file_override: Option<PathBuf>) -> anyhow::Result<RosterSource> {
        if let Some(path) = file_override.or_else(|| self.roster_file.clone()) {
            return Ok(RosterSource::File(path));
        }
        let url = self
            .require_database_url()
            .context("no roster file given and no database configured")?;
        Ok(RosterSource::Database(url.to_string()))
    }
}
