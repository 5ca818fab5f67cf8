//! Songbook - an ordered song catalog with categories and chord-sheet links
//!
//! Songs live in SQLite and carry a dense, zero-based `order` that the
//! [`SongService`] keeps intact across add, delete and up/down moves.

pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod service;

pub use database::{Database, DbCategory, DbSong, Direction, SongFilter, SongForm};
pub use error::{Error, Result};
pub use service::SongService;
