//! Burn-window API service library.
//!
//! This module exposes the internal modules for testing purposes.

pub mod cleanup;
pub mod config;
pub mod county;
pub mod handlers;
pub mod metrics;
pub mod pipeline;
pub mod server;
pub mod state;
