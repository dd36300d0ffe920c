// ABOUTME: Library root for rokka - batch engine, API client and configuration.
// ABOUTME: The main binary is in main.rs.

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod sourceimages;
pub mod transport;
pub mod types;
