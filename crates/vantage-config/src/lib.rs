//! Configuration for the Vantage performance manager.
//!
//! Runtime-tunable settings for the adaptive quality loop, pools, asset
//! optimizers and the simulation harness, persisted as RON. Supports CLI
//! overrides via clap and hot-reload detection.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AssetConfig, CONFIG_FILE_NAME, Config, DebugConfig, LadderEntry, PoolConfig, QualityConfig,
    SimConfig,
};
pub use error::ConfigError;
