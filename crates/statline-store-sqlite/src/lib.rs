//! SQLite backend for the statline status tracker.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The status engine itself runs inside
//! that thread against a [`SqliteSession`].

mod encode;
mod schema;
mod session;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use session::SqliteSession;
pub use store::SqliteStore;
