//! Serial and button driven client for an OpenClaw chat-completion gateway.
//!
//! The modules here are free of ESP-IDF types; the firmware binary plugs the
//! Wi-Fi, HTTP, GPIO and I2C drivers in through the traits they define.

pub mod chat;
pub mod config;
pub mod connectivity;
pub mod identity;
pub mod input;
pub mod probe;
#[cfg(test)]
mod secrets_file;
pub mod session;
