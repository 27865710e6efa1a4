//! Notification feed loading.
//!
//! A feed page is the JSON body of a Mastodon `GET /api/v1/notifications`
//! response: an array of notification objects. Several pages can be read
//! in order and are concatenated before grouping.

use crate::grouping::{validate, MalformedPolicy, SkippedRecord};
use crate::models::{NotificationKind, RawNotification};
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Path that stands for standard input.
pub const STDIN_PATH: &str = "-";

/// Notifications read from one or more feed pages.
#[derive(Debug, Clone, Default)]
pub struct LoadedFeed {
    /// Decoded notifications, in page order.
    pub notifications: Vec<RawNotification>,
    /// Records that could not be decoded.
    pub skipped: Vec<SkippedRecord>,
    /// Display names of the pages that were read.
    pub sources: Vec<String>,
}

impl LoadedFeed {
    /// Drops notifications of the given kinds. Returns how many were removed.
    pub fn exclude_kinds(&mut self, kinds: &[NotificationKind]) -> usize {
        if kinds.is_empty() {
            return 0;
        }

        let before = self.notifications.len();
        self.notifications.retain(|n| !kinds.contains(&n.kind));
        let removed = before - self.notifications.len();

        if removed > 0 {
            debug!("Excluded {} notifications by type", removed);
        }
        removed
    }
}

/// Load and concatenate feed pages.
pub fn load_pages(paths: &[PathBuf], policy: MalformedPolicy) -> Result<LoadedFeed> {
    let mut feed = LoadedFeed::default();

    for path in paths {
        let origin = display_name(path);
        let content = read_page(path)?;
        let (notifications, skipped) = parse_page(&content, &origin, policy)?;

        info!(
            "Read {} notifications from {} ({} skipped)",
            notifications.len(),
            origin,
            skipped.len()
        );

        feed.notifications.extend(notifications);
        feed.skipped.extend(skipped);
        feed.sources.push(origin);
    }

    Ok(feed)
}

/// Read a page from disk, or from stdin for [`STDIN_PATH`].
pub fn read_page(path: &Path) -> Result<String> {
    if path.as_os_str() == STDIN_PATH {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read notifications from stdin")?;
        return Ok(content);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feed page: {}", path.display()))
}

/// Decode a page, one record at a time.
///
/// A page that is not a JSON array is always an error. Records that fail
/// to decode, or that carry an empty account id or type, are skipped or
/// fail the page according to `policy`. Either way they are reported by
/// their position within this page.
pub fn parse_page(
    content: &str,
    origin: &str,
    policy: MalformedPolicy,
) -> Result<(Vec<RawNotification>, Vec<SkippedRecord>)> {
    let value: Value = serde_json::from_str(content)
        .with_context(|| format!("Failed to parse feed page as JSON: {}", origin))?;

    let records = match value {
        Value::Array(records) => records,
        other => bail!(
            "Feed page {} must be a JSON array of notifications, found {}",
            origin,
            json_type_name(&other)
        ),
    };

    let mut notifications = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let decoded = serde_json::from_value::<RawNotification>(record)
            .map_err(|e| e.to_string())
            .and_then(|n| validate(&n).map(|_| n).map_err(|e| e.to_string()));

        match decoded {
            Ok(notification) => notifications.push(notification),
            Err(reason) => match policy {
                MalformedPolicy::Fail => {
                    bail!("Malformed notification #{} in {}: {}", index, origin, reason)
                }
                MalformedPolicy::Skip => {
                    warn!("Skipping notification #{} in {}: {}", index, origin, reason);
                    skipped.push(SkippedRecord {
                        origin: origin.to_string(),
                        index,
                        reason,
                    });
                }
            },
        }
    }

    Ok((notifications, skipped))
}

fn display_name(path: &Path) -> String {
    if path.as_os_str() == STDIN_PATH {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
