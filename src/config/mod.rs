//! Configuration management module
//!
//! This module handles loading and validating application configuration
//! from environment variables, .env files, and an optional
//! local.settings.json file.

pub mod settings;

pub use settings::{CosmosSettings, Environment, Settings};
