//! Environment configuration helpers
//!
//! Config structs across the workspace are built from defaults and then
//! overridden by environment variables through these helpers.

use std::str::FromStr;
use thiserror::Error;

/// Error raised when an environment variable is present but malformed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid value for {key}: {value:?} ({reason})")]
pub struct EnvError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Read a non-empty environment variable
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read an environment variable or fall back to a default
pub fn env_or(key: &str, default: &str) -> String {
    env_var(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, `Ok(None)` when unset
pub fn env_parse<T>(key: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| EnvError {
            key: key.to_string(),
            value: raw,
            reason: e.to_string(),
        }),
    }
}

/// Parse a boolean flag (`1/0`, `true/false`, `yes/no`, `on/off`)
pub fn env_bool(key: &str) -> Result<Option<bool>, EnvError> {
    match env_var(key) {
        None => Ok(None),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(EnvError {
                key: key.to_string(),
                value: raw,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}
