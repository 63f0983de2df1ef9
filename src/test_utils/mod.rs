//! Shared components between the unit suites: logging setup, entity and
//! entry builders, projection assertions, and the in-memory test backing.

mod builders;
mod common;
mod test_backing;

pub use builders::*;
pub use common::*;
pub use test_backing::*;
