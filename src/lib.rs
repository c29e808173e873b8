//! Alpaca Gateway Library
//!
//! Rate-limited gateway between local clients (HTTP callers, CLIs) and the
//! Alpaca brokerage REST API: shared dual-window call limiting, local order
//! validation, and normalization of remote records and failures into one
//! canonical result shape.

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod rate_limit;
