//! Shared utilities for the stock analyst workspace
//!
//! This crate provides common functionality used by the library and server
//! crates: tracing setup and typed access to environment variables.

pub mod config;
pub mod logging;

pub use config::{EnvError, env_bool, env_or, env_parse, env_var};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
