pub mod classify;
pub mod config;
pub mod error;
pub mod io;
pub mod mirror;
pub mod model;
pub mod roster;
pub mod sync;

pub use error::{Result, SyncError};
