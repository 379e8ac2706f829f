//! Shared utilities for tickerlens
//!
//! This crate provides common functionality used across the tickerlens
//! workspace: logging setup and environment helpers.

pub mod env;
pub mod logging;

pub use env::{env_or, optional_env};
pub use logging::init_tracing;
