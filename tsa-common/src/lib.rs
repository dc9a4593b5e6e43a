//! # TSA Common Library
//!
//! Shared code for the text-simplification analysis crates:
//! - Error type and result alias
//! - TOML configuration loading and resolution
//! - Static strategy taxonomy (14 simplification strategy codes)

pub mod config;
pub mod error;
pub mod taxonomy;

pub use error::{Error, Result};
pub use taxonomy::{StrategyDescriptor, StrategyType, Tier};
