//! # allwatcher
//!
//! An incremental state-replication watcher: one in-process aggregator
//! maintains a revision-stamped projection of every cluster entity and
//! streams coherent deltas to any number of independently paced clients.
//!
//! ## Features
//! - **Revision-stamped projection**: every mutation stamps a monotonic
//!   revision; clients replay only what they have not yet seen
//! - **Tombstone accounting**: a removal is retained exactly until every
//!   client that saw the entity live has observed it
//! - **Single-owner core**: one dispatch loop owns the projection; the
//!   backing and all clients communicate over channels only
//! - **Pluggable backing**: any authoritative store feeds the aggregator
//!   through the [`Backing`] trait
//!
//! ## Quick Start
//! ```ignore
//! use allwatcher::AllWatcher;
//! use allwatcher::WatcherConfig;
//!
//! let (aggregator, handle) = AllWatcher::new(backing, WatcherConfig::new()?);
//! tokio::spawn(aggregator.run());
//!
//! let mut watcher = handle.watcher();
//! while let Ok(deltas) = watcher.next().await {
//!     for delta in deltas {
//!         println!("{delta:?}");
//!     }
//! }
//! ```

pub mod backing;
pub mod config;
pub mod entity;

mod core;
mod errors;

pub use backing::*;
pub use entity::*;
pub use errors::*;
pub use self::config::*;
pub use self::core::*;

//-----------------------------------------------------------
// Test utils
#[cfg(test)]
#[doc(hidden)]
pub mod test_utils;
