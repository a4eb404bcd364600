use crate::errors::{AppError, AppResult};
use chrono::{FixedOffset, Local};
use std::{env, path::PathBuf};

/// Which backend and UI flavour the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `personas`/`asistencias` tables behind an operator login, two event days.
    Tables,
    /// A single roster document with per-person status, no login.
    Roster,
}

impl Mode {
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tables" | "remote" => Ok(Self::Tables),
            "roster" | "local" => Ok(Self::Roster),
            other => Err(AppError::Config(format!(
                "APP_MODE must be 'tables' or 'roster', got '{other}'"
            ))),
        }
    }

    fn default_data_path(self) -> PathBuf {
        match self {
            Self::Tables => PathBuf::from("data/tables.json"),
            Self::Roster => PathBuf::from("data/roster.json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mode: Mode,
    pub data_path: PathBuf,
    pub operator: Option<Credentials>,
    /// Offset used when showing and exporting timestamps.
    pub utc_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let mode = match lookup("APP_MODE") {
            Some(value) => Mode::parse(&value)?,
            None => Mode::Tables,
        };

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| mode.default_data_path());

        let operator = match (lookup("APP_OPERATOR_EMAIL"), lookup("APP_OPERATOR_PASSWORD")) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(Credentials {
                    email: email.trim().to_string(),
                    password,
                })
            }
            _ => None,
        };

        if mode == Mode::Tables && operator.is_none() {
            return Err(AppError::Config(
                "APP_OPERATOR_EMAIL and APP_OPERATOR_PASSWORD must be set in tables mode"
                    .to_string(),
            ));
        }

        let utc_offset = match lookup("APP_UTC_OFFSET_MINUTES") {
            Some(value) => parse_offset_minutes(&value)?,
            None => *Local::now().offset(),
        };

        Ok(Self {
            port,
            mode,
            data_path,
            operator,
            utc_offset,
        })
    }
}

fn parse_offset_minutes(value: &str) -> AppResult<FixedOffset> {
    let minutes: i32 = value.trim().parse().map_err(|_| {
        AppError::Config(format!("APP_UTC_OFFSET_MINUTES is not a number: '{value}'"))
    })?;
    minutes.checked_mul(60).and_then(FixedOffset::east_opt).ok_or_else(|| {
        AppError::Config(format!("APP_UTC_OFFSET_MINUTES out of range: {minutes}"))
    })
}
