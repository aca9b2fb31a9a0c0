//! Roll inventory domain.
//!
//! Business rules for rolls and their period statistics, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod filter;
pub mod roll;
pub mod stats;

pub use filter::{Range, RollFilter};
pub use roll::{NewRoll, Roll};
pub use stats::{
    DailyOccupancy, DurationRange, StatsError, StatsReport, StatsWindow, compute_stats, duration_range,
};
