//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is alive.
//!
//! # Tasks
//! - Refresh: Reloads resident entries from the backing store at a fixed period

mod refresh;

pub use refresh::RefreshHandle;
pub(crate) use refresh::spawn_refresh_task;
