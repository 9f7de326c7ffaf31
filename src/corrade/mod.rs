//! Corrade group chat over MQTT: credentials, topics and payload encoding.

pub mod codec;
pub mod credential;

pub use credential::GroupCredential;
