//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the offline sync crates:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate establishes the logging conventions, the fail-fast bridge
//! configuration and the event broadcasting used by `core-offline-sync`.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
