// Process configuration, loaded once at startup from the environment
// (`.env` is honored by the binary before this runs).

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Shared administrator secret checked on every mutating request.
    pub admin_secret: String,
    pub database_path: PathBuf,
    pub bind_addr: String,
    /// Feeds the days-since counter on the summary view.
    pub revolution_start: Option<NaiveDate>,
    pub internet_shutdown_start: Option<NaiveDate>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let admin_secret =
            env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;
        if admin_secret.is_empty() {
            bail!("ADMIN_PASSWORD must not be empty");
        }

        let database_path = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "archive.db".to_string())
            .into();
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Config {
            admin_secret,
            database_path,
            bind_addr,
            revolution_start: optional_date("REVOLUTION_START_DATE")?,
            internet_shutdown_start: optional_date("INTERNET_SHUTDOWN_START_DATE")?,
        })
    }
}

fn optional_date(key: &str) -> Result<Option<NaiveDate>> {
    match env::var(key) {
        Ok(raw) => {
            let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .with_context(|| format!("{key} must be a YYYY-MM-DD date, got {raw:?}"))?;
            Ok(Some(date))
        }
        Err(_) => Ok(None),
    }
}
