//! Data models for the notification grouper.
//!
//! This module contains the records read from a notification feed,
//! the grouped entries produced from them, and the report structures
//! built on top of those groups.

use crate::grouping::SkippedRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Wire name of the collapsed favourite/reblog group type.
pub const FAVOURITE_REBLOG: &str = "favourite+reblog";

/// Kind of a raw notification, as sent in the `type` field.
///
/// Servers add new kinds over time, so anything unrecognised is kept
/// verbatim in [`NotificationKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    Favourite,
    Reblog,
    Follow,
    FollowRequest,
    Mention,
    Poll,
    Status,
    Update,
    AdminSignUp,
    AdminReport,
    Other(String),
}

impl NotificationKind {
    /// Returns the wire name of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::Favourite => "favourite",
            NotificationKind::Reblog => "reblog",
            NotificationKind::Follow => "follow",
            NotificationKind::FollowRequest => "follow_request",
            NotificationKind::Mention => "mention",
            NotificationKind::Poll => "poll",
            NotificationKind::Status => "status",
            NotificationKind::Update => "update",
            NotificationKind::AdminSignUp => "admin.sign_up",
            NotificationKind::AdminReport => "admin.report",
            NotificationKind::Other(s) => s,
        }
    }

    /// Returns an emoji used when rendering the kind.
    pub fn emoji(&self) -> &'static str {
        match self {
            NotificationKind::Favourite => "⭐",
            NotificationKind::Reblog => "🔁",
            NotificationKind::Follow | NotificationKind::FollowRequest => "👤",
            NotificationKind::Mention => "💬",
            NotificationKind::Poll => "📊",
            NotificationKind::Status => "📝",
            NotificationKind::Update => "✏️",
            NotificationKind::AdminSignUp | NotificationKind::AdminReport => "🛡️",
            NotificationKind::Other(_) => "🔔",
        }
    }
}

impl From<&str> for NotificationKind {
    fn from(s: &str) -> Self {
        match s {
            "favourite" => NotificationKind::Favourite,
            "reblog" => NotificationKind::Reblog,
            "follow" => NotificationKind::Follow,
            "follow_request" => NotificationKind::FollowRequest,
            "mention" => NotificationKind::Mention,
            "poll" => NotificationKind::Poll,
            "status" => NotificationKind::Status,
            "update" => NotificationKind::Update,
            "admin.sign_up" => NotificationKind::AdminSignUp,
            "admin.report" => NotificationKind::AdminReport,
            other => NotificationKind::Other(other.to_string()),
        }
    }
}

impl From<String> for NotificationKind {
    fn from(s: String) -> Self {
        let kind = NotificationKind::from(s.as_str());
        match kind {
            NotificationKind::Other(_) => NotificationKind::Other(s),
            known => known,
        }
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a grouped entry.
///
/// Favourites and reblogs share one bucket; every other kind groups
/// under its own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GroupKind {
    FavouriteReblog,
    Single(NotificationKind),
}

impl GroupKind {
    /// Returns the group type a raw notification kind falls under.
    pub fn of(kind: &NotificationKind) -> Self {
        match kind {
            NotificationKind::Favourite | NotificationKind::Reblog => GroupKind::FavouriteReblog,
            other => GroupKind::Single(other.clone()),
        }
    }

    /// Returns the wire name of the group type.
    pub fn as_str(&self) -> &str {
        match self {
            GroupKind::FavouriteReblog => FAVOURITE_REBLOG,
            GroupKind::Single(kind) => kind.as_str(),
        }
    }
}

impl From<String> for GroupKind {
    fn from(s: String) -> Self {
        if s == FAVOURITE_REBLOG {
            GroupKind::FavouriteReblog
        } else {
            GroupKind::Single(NotificationKind::from(s))
        }
    }
}

impl From<GroupKind> for String {
    fn from(kind: GroupKind) -> Self {
        match kind {
            GroupKind::FavouriteReblog => FAVOURITE_REBLOG.to_string(),
            GroupKind::Single(kind) => kind.into(),
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The account that performed the action behind a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable account id on the home server.
    pub id: String,
    /// Account handle, `user` for local accounts and `user@domain` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acct: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Account {
    /// Creates an account known only by its id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            acct: None,
            username: None,
            display_name: None,
            url: None,
            avatar: None,
        }
    }

    /// Returns the best human-readable handle for the account.
    pub fn handle(&self) -> String {
        match (&self.acct, &self.username) {
            (Some(acct), _) if !acct.is_empty() => format!("@{}", acct),
            (_, Some(username)) if !username.is_empty() => format!("@{}", username),
            _ => self.id.clone(),
        }
    }
}

/// Reference to the post a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl StatusRef {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: None,
            content: None,
        }
    }
}

/// A single notification as delivered by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNotification {
    /// Opaque id, not used for grouping.
    #[serde(default)]
    pub id: String,
    /// Raw notification type.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// When the notification was created.
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// The acting account.
    pub account: Account,
    /// Target post, absent for account-level notifications such as follows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusRef>,
}

/// An actor inside a group, together with every raw type it contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedAccount {
    #[serde(flatten)]
    pub account: Account,
    /// Contributed types, in descending wire-name order.
    pub types: Vec<NotificationKind>,
}

impl GroupedAccount {
    pub fn new(account: Account, kind: NotificationKind) -> Self {
        Self {
            account,
            types: vec![kind],
        }
    }

    /// Records another contributed type and restores descending order.
    pub fn push_type(&mut self, kind: NotificationKind) {
        self.types.push(kind);
        self.types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        self.types.reverse();
    }
}

/// A display-ready entry built from one or more raw notifications.
///
/// The base fields come from the first notification seen for the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedNotification {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: GroupKind,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub account: Account,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusRef>,
    /// Contributing actors in first-seen order. Empty for follow requests.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<GroupedAccount>,
}

impl GroupedNotification {
    /// Opens a new group with `notification` as its representative.
    pub fn open(notification: &RawNotification, kind: GroupKind) -> Self {
        Self {
            id: notification.id.clone(),
            kind,
            created_at: notification.created_at,
            account: notification.account.clone(),
            status: notification.status.clone(),
            accounts: vec![GroupedAccount::new(
                notification.account.clone(),
                notification.kind.clone(),
            )],
        }
    }

    /// Builds an entry that stands on its own and never gains members.
    pub fn standalone(notification: &RawNotification) -> Self {
        Self {
            id: notification.id.clone(),
            kind: GroupKind::Single(notification.kind.clone()),
            created_at: notification.created_at,
            account: notification.account.clone(),
            status: notification.status.clone(),
            accounts: Vec::new(),
        }
    }

    /// Whether this entry was emitted without an actor list.
    pub fn is_standalone(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Number of raw notifications folded into this entry.
    pub fn notification_count(&self) -> usize {
        if self.is_standalone() {
            1
        } else {
            self.accounts.iter().map(|a| a.types.len()).sum()
        }
    }
}

/// How many notifications one account contributed across all groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountActivity {
    pub account: Account,
    pub notifications: usize,
}

/// Summary of a grouped feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Number of grouped entries.
    pub total_groups: usize,
    /// Number of raw notifications represented by those entries.
    pub total_notifications: usize,
    /// Entries per group type.
    pub by_type: HashMap<String, usize>,
}

impl GroupSummary {
    /// Creates a summary from a list of grouped entries.
    pub fn from_groups(groups: &[GroupedNotification]) -> Self {
        let mut summary = Self {
            total_groups: groups.len(),
            ..Self::default()
        };

        for group in groups {
            summary.total_notifications += group.notification_count();
            *summary
                .by_type
                .entry(group.kind.as_str().to_string())
                .or_insert(0) += 1;
        }

        summary
    }
}

/// Metadata about a grouping report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Feed pages that were read, in order.
    pub sources: Vec<String>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Timezone used to compute calendar days.
    pub day_zone: String,
    /// Notifications read from the feed.
    pub input_notifications: usize,
    /// Notifications removed by the type filter.
    pub excluded_notifications: usize,
    /// Records dropped as malformed.
    pub skipped_records: usize,
    /// Processing time in seconds.
    pub duration_seconds: f64,
}

/// The complete grouping report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: GroupSummary,
    /// Accounts with the most contributions, busiest first.
    pub top_accounts: Vec<AccountActivity>,
    /// Grouped entries in output order.
    pub groups: Vec<GroupedNotification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
}
