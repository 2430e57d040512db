//! Database module for Cockpit.
//!
//! Provides SQLite storage with embedded migrations, behind repository traits
//! so the monitor can run against any store.

#[cfg(test)]
mod memory;
mod models;
mod repository;
mod store;

#[cfg(test)]
pub use memory::*;
pub use models::*;
pub use repository::*;
pub use store::*;
