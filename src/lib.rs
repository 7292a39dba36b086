//! Mixture library
//!
//! Composes a bundler configuration from script and style ingredients, then
//! drives the two pieces of build-time behavior that configuration needs:
//! per-entry stylesheet chunk classification and artifact cleanup.

pub mod bundler;
pub mod cli;
pub mod composer;
pub mod config;
pub mod entry;
pub mod error;
pub mod lifecycle;
pub mod naming;
pub mod plugins;
pub mod utils;

pub use bundler::Bundler;
pub use cli::Cli;
pub use composer::{BundlerConfig, Composer};
pub use config::Config;
pub use error::{MixError, Result};
