//! Pipeline entry points for monitoring runs.
//!
//! - `diff`: Decide whether a freshly extracted fact differs from the stored one
//! - `heartbeat`: Health-check cadence
//! - `monitor`: Drive every source through fetch → extract → detect → alert → persist

pub mod diff;
pub mod heartbeat;
pub mod monitor;

pub use diff::{ChangeEvent, detect};
pub use heartbeat::is_due;
pub use monitor::{Monitor, RunReport, SourceOutcome};
