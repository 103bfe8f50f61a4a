//! Kestrel - minimal command-line agent
//!
//! This library provides the agent loop, the chat completions client and
//! the local tools the model can call.

pub mod agent;
pub mod config;
pub mod error;
pub mod tools;
pub mod ui;

pub use error::{Error, Result};
