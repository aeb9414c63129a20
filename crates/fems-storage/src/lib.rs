//! FEMS Storage Layer
//!
//! SQLite-backed stand-in for the browser's durable local storage.
//! Survives restarts of the same profile; nothing here syncs across devices.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
