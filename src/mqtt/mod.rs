//! MQTT transport for Corrade group notifications and commands.

pub mod client;

pub use client::connect;
