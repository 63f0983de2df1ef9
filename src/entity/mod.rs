//! The entity model the aggregator projects: kinds, identities, concrete
//! payloads, and the delta envelope delivered to clients.

mod delta;
mod info;

pub use delta::*;
pub use info::*;
