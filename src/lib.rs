//! Notifold - Fediverse notification grouping.
//!
//! Folds a Mastodon notification feed into compact entries: favourites
//! and boosts of the same post on the same day become one entry listing
//! every account involved, follows on the same day collapse together,
//! and follow requests always stand alone.
//!
//! ```
//! use notifold::grouping::{aggregate_in, DayZone};
//! use notifold::models::RawNotification;
//!
//! let feed: Vec<RawNotification> = serde_json::from_str(r#"[
//!     {"id": "1", "type": "favourite", "created_at": "2024-01-01T10:00:00Z",
//!      "account": {"id": "A"}, "status": {"id": "S1"}},
//!     {"id": "2", "type": "reblog", "created_at": "2024-01-01T11:00:00Z",
//!      "account": {"id": "B"}, "status": {"id": "S1"}}
//! ]"#).unwrap();
//!
//! let groups = aggregate_in(&feed, DayZone::utc());
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].kind.as_str(), "favourite+reblog");
//! assert_eq!(groups[0].accounts.len(), 2);
//! ```

pub mod cli;
pub mod config;
pub mod feed;
pub mod grouping;
pub mod models;
pub mod report;

pub use grouping::{aggregate, aggregate_in, Aggregator, DayZone, MalformedPolicy};
pub use models::{GroupedNotification, RawNotification};
