//! reelsmith Core - Foundational types shared by the reelsmith crates
//!
//! - `ReelError` and the `Result` alias
//! - UTC timestamp helpers used by every persisted document

mod error;
mod time;

pub use error::{ReelError, Result};
pub use time::{now_rfc3339, timestamp_rfc3339};
