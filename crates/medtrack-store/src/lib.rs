//! # medtrack-store
//!
//! In-memory storage engine for medications and their dose logs.
//!
//! The crate exposes a cloneable [`MemStore`] handle with synchronous CRUD
//! helpers for both entities plus the derived reads the dashboard needs
//! (today's logs, weekly adherence, active and missed counts). Nothing is
//! persisted; a fresh store starts empty.

pub mod clock;
pub mod logs;
pub mod medications;
pub mod stats;
pub mod store;

mod error;

pub use clock::{Clock, FixedClock, LocalClock, UtcClock};
pub use error::{Entity, Result, StoreError};
pub use store::MemStore;
