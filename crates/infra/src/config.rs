//! Process configuration, read from environment variables.

use std::net::SocketAddr;

use chrono::NaiveTime;
use thiserror::Error;

use clinic_scheduling::{parse_slot_label, WorkingHours};

pub const BIND_ADDR: &str = "CLINIC_BIND_ADDR";
pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DAY_START: &str = "CLINIC_DAY_START";
pub const DAY_END: &str = "CLINIC_DAY_END";
pub const SLOT_MINUTES: &str = "CLINIC_SLOT_MINUTES";
pub const NOTIFY_WEBHOOK_URL: &str = "CLINIC_NOTIFY_WEBHOOK_URL";
pub const SEED_SAMPLE_DATA: &str = "CLINIC_SEED_SAMPLE_DATA";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub working_hours: WorkingHours,
    pub notify_webhook_url: Option<String>,
    pub seed_sample_data: bool,
}

impl ClinicConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get(BIND_ADDR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid(BIND_ADDR, e.to_string()))?;

        let defaults = WorkingHours::default();
        let start = parse_time(DAY_START, get(DAY_START))?.unwrap_or(defaults.start());
        let end = parse_time(DAY_END, get(DAY_END))?.unwrap_or(defaults.end());
        let slot_minutes = match get(SLOT_MINUTES) {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| ConfigError::invalid(SLOT_MINUTES, e.to_string()))?,
            None => defaults.slot_minutes(),
        };
        let working_hours = WorkingHours::new(start, end, slot_minutes)
            .map_err(|e| ConfigError::invalid(DAY_START, e.to_string()))?;

        let seed_sample_data = match get(SEED_SAMPLE_DATA).map(|v| v.to_ascii_lowercase()) {
            None => false,
            Some(v) if v == "1" || v == "true" || v == "yes" => true,
            Some(v) if v == "0" || v == "false" || v == "no" => false,
            Some(v) => return Err(ConfigError::invalid(SEED_SAMPLE_DATA, format!("expected a boolean, got '{v}'"))),
        };

        Ok(Self {
            bind_addr,
            database_url: get(DATABASE_URL),
            working_hours,
            notify_webhook_url: get(NOTIFY_WEBHOOK_URL),
            seed_sample_data,
        })
    }
}

fn parse_time(var: &'static str, raw: Option<String>) -> Result<Option<NaiveTime>, ConfigError> {
    raw.map(|v| parse_slot_label(&v).map_err(|e| ConfigError::invalid(var, e.to_string())))
        .transpose()
}
