//! Notification grouping.
//!
//! Folds an ordered batch of raw notifications into grouped entries and
//! computes statistics over the result.

pub mod aggregator;
pub mod day_zone;
pub mod error;
pub mod stats;

pub use aggregator::{aggregate, aggregate_in, validate, Aggregation, Aggregator};
pub use day_zone::DayZone;
pub use error::{GroupingError, Malformation, MalformedPolicy, SkippedRecord};
pub use stats::*;
