//! Configuration for the aggregator.
//!
//! Hierarchical loading with the usual override order:
//! - Default values as code base
//! - Configuration file named by `CONFIG_PATH`
//! - Environment variables (highest priority)

use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;


/// Tunables of the dispatch loop.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatcherConfig {
    /// Capacity of the backing change-event channel. A full buffer applies
    /// backpressure to the backing rather than dropping events.
    #[serde(default = "default_change_buffer_capacity")]
    pub change_buffer_capacity: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        WatcherConfig {
            change_buffer_capacity: default_change_buffer_capacity(),
        }
    }
}

fn default_change_buffer_capacity() -> usize {
    64
}

impl WatcherConfig {
    /// Loads the configuration with hierarchical override support:
    /// defaults, then the file named by `CONFIG_PATH` if set, then
    /// `WATCHER__`-prefixed environment variables.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("WATCHER")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: WatcherConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.change_buffer_capacity == 0 {
            return Err(Error::InvalidConfig(
                "change_buffer_capacity must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
