mod all_info;
mod all_watcher;
mod state_watcher;

pub use all_info::*;
pub use all_watcher::*;
pub use state_watcher::*;
