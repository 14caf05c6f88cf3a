//! Middleware module
//!
//! Contains HTTP middleware applied to the application router.

pub mod logging;

pub use logging::log_request;
