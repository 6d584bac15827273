//! Data models
//!
//! This module contains the uniform gateway types and the provider
//! wire-format response shapes.

pub mod request;
pub mod wire;
