//! Core gateway modules
//!
//! This module contains the provider catalog, configuration, logging,
//! cost calculation, transport, and the invocation orchestrator.

pub mod catalog;
pub mod config;
pub mod cost;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod transport;
