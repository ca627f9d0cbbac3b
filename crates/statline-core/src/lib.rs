//! Core types and trait definitions for the statline status tracker.
//!
//! This crate is deliberately free of database and runtime dependencies.
//! It holds the interval model, the status engine and the transaction
//! coordinator; backends plug in through [`store::StatusStore`].

pub mod engine;
pub mod entity;
pub mod error;
pub mod status;
pub mod store;
pub mod tracker;
pub mod transaction;

pub use engine::StatusHistory;
pub use error::{Error, Result, StatusCreationError};
