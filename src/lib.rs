pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod launcher;
pub mod locator;
pub mod orchestrator;
pub mod platform;
pub mod service;
pub mod startup;

pub use anyhow::Result;
