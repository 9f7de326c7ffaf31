//! Discord bot integration.
//!
//! This module provides the Discord side of the bridge: the gateway
//! connection, event conversion and message sending.

pub mod client;
pub mod handler;

pub use client::build;
