//! Core domain + pipeline for the inactive channel reaper.
//!
//! This crate is intentionally platform-agnostic. The messaging platform lives
//! behind the [`ports::ChannelGateway`] trait, implemented in adapter crates.

pub mod activity;
pub mod archiver;
pub mod config;
pub mod domain;
pub mod driver;
pub mod eligibility;
pub mod errors;
pub mod logging;
pub mod policy;
pub mod ports;
pub mod retry;
pub mod scanner;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
