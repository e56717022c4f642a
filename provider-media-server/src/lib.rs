//! # Media Server Provider
//!
//! Implements `MediaServerClient` for a media server's sync API.
//!
//! ## Overview
//!
//! This module provides:
//! - Offline action upload and inventory reconciliation
//! - Ready job item listing and transfer acknowledgment
//! - Download URL builders for media files, images and additional files
//! - Retry with exponential backoff for idempotent reads

pub mod connector;
pub mod error;

pub use connector::MediaServerConnector;
pub use error::{MediaServerError, Result};
