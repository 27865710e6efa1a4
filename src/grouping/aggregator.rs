//! Notification aggregation.
//!
//! A single ordered pass over a batch of raw notifications. Notifications
//! about the same post (or about no post), with the same group type, on the
//! same calendar day fold into one entry; the entries come out in the order
//! their first notification appeared. Follow requests are never folded.

use super::day_zone::DayZone;
use super::error::{GroupingError, Malformation, MalformedPolicy, SkippedRecord};
use crate::models::{
    Account, GroupKind, GroupedAccount, GroupedNotification, NotificationKind, RawNotification,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Identity of a group: target post, group type and calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    status_id: Option<String>,
    kind: GroupKind,
    day: NaiveDate,
}

/// Emission-ordered groups plus a key lookup into them.
///
/// `positions` only holds mergeable groups; standalone entries are
/// emitted into `groups` without a key.
#[derive(Debug, Default)]
struct GroupIndex {
    positions: HashMap<GroupKey, usize>,
    groups: Vec<GroupedNotification>,
}

impl GroupIndex {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: HashMap::with_capacity(capacity),
            groups: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, notification: &RawNotification, zone: DayZone) {
        // Checked on the raw kind, before favourites and reblogs are collapsed.
        if notification.kind == NotificationKind::FollowRequest {
            self.groups
                .push(GroupedNotification::standalone(notification));
            return;
        }

        let kind = GroupKind::of(&notification.kind);
        let key = GroupKey {
            status_id: notification.status.as_ref().map(|s| s.id.clone()),
            kind: kind.clone(),
            day: zone.day_of(&notification.created_at),
        };

        match self.positions.get(&key) {
            Some(&position) => add_contribution(
                &mut self.groups[position],
                &notification.account,
                &notification.kind,
            ),
            None => {
                self.positions.insert(key, self.groups.len());
                self.groups
                    .push(GroupedNotification::open(notification, kind));
            }
        }
    }

    fn into_groups(self) -> Vec<GroupedNotification> {
        self.groups
    }
}

/// Folds one more notification from `account` into an existing group.
fn add_contribution(group: &mut GroupedNotification, account: &Account, kind: &NotificationKind) {
    match group.accounts.iter_mut().find(|a| a.account.id == account.id) {
        Some(existing) => existing.push_type(kind.clone()),
        None => group
            .accounts
            .push(GroupedAccount::new(account.clone(), kind.clone())),
    }
}

/// Checks the fields grouping relies on.
pub fn validate(notification: &RawNotification) -> Result<(), Malformation> {
    if notification.account.id.is_empty() {
        return Err(Malformation::EmptyAccountId);
    }
    if notification.kind.as_str().is_empty() {
        return Err(Malformation::EmptyType);
    }
    Ok(())
}

/// Groups notifications using the local timezone for day boundaries.
pub fn aggregate(notifications: &[RawNotification]) -> Vec<GroupedNotification> {
    aggregate_in(notifications, DayZone::Local)
}

/// Groups notifications with day boundaries taken in `zone`.
///
/// No validation is done; use [`Aggregator`] for feeds that may carry
/// broken records.
pub fn aggregate_in(notifications: &[RawNotification], zone: DayZone) -> Vec<GroupedNotification> {
    let mut index = GroupIndex::with_capacity(notifications.len());
    for notification in notifications {
        index.push(notification, zone);
    }
    index.into_groups()
}

/// Output of a validating aggregation run.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub groups: Vec<GroupedNotification>,
    /// Records left out under [`MalformedPolicy::Skip`].
    pub skipped: Vec<SkippedRecord>,
}

/// Validating aggregator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    pub zone: DayZone,
    pub policy: MalformedPolicy,
}

impl Aggregator {
    pub fn new(zone: DayZone, policy: MalformedPolicy) -> Self {
        Self { zone, policy }
    }

    /// Groups a batch, rejecting records with an empty account id or type.
    ///
    /// Under [`MalformedPolicy::Fail`] the first bad record aborts the batch
    /// and nothing is returned.
    pub fn aggregate(
        &self,
        notifications: &[RawNotification],
    ) -> Result<Aggregation, GroupingError> {
        let mut index = GroupIndex::with_capacity(notifications.len());
        let mut skipped = Vec::new();

        for (i, notification) in notifications.iter().enumerate() {
            if let Err(reason) = validate(notification) {
                match self.policy {
                    MalformedPolicy::Fail => {
                        return Err(GroupingError::Malformed { index: i, reason });
                    }
                    MalformedPolicy::Skip => {
                        warn!(index = i, id = %notification.id, %reason, "Skipping malformed notification");
                        skipped.push(SkippedRecord {
                            origin: "input".to_string(),
                            index: i,
                            reason: reason.to_string(),
                        });
                        continue;
                    }
                }
            }

            index.push(notification, self.zone);
        }

        let groups = index.into_groups();
        debug!(
            input = notifications.len(),
            groups = groups.len(),
            skipped = skipped.len(),
            zone = %self.zone,
            "Aggregated notifications"
        );

        Ok(Aggregation { groups, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::represented_count;
    use crate::models::StatusRef;
    use chrono::{DateTime, Utc};

    fn create_test_notification(
        kind: &str,
        account: &str,
        status: Option<&str>,
        created_at: &str,
    ) -> RawNotification {
        RawNotification {
            id: format!("{}-{}-{}", kind, account, created_at),
            kind: NotificationKind::from(kind),
            created_at: DateTime::parse_from_rfc3339(created_at)
                .unwrap()
                .with_timezone(&Utc),
            account: Account::with_id(account),
            status: status.map(StatusRef::with_id),
        }
    }

    fn group_utc(notifications: &[RawNotification]) -> Vec<GroupedNotification> {
        aggregate_in(notifications, DayZone::utc())
    }

    fn account_ids(group: &GroupedNotification) -> Vec<&str> {
        group.accounts.iter().map(|a| a.account.id.as_str()).collect()
    }

    #[test]
    fn test_every_notification_is_represented() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:05:00Z"),
            create_test_notification("reblog", "B", Some("S1"), "2024-01-01T11:00:00Z"),
            create_test_notification("follow", "C", None, "2024-01-01T12:00:00Z"),
            create_test_notification("follow_request", "D", None, "2024-01-01T12:00:00Z"),
            create_test_notification("mention", "E", Some("S2"), "2024-01-02T09:00:00Z"),
            create_test_notification("follow", "F", None, "2024-01-02T12:00:00Z"),
        ];

        let groups = group_utc(&input);

        assert!(groups.len() <= input.len());
        assert_eq!(represented_count(&groups), input.len());
    }

    #[test]
    fn test_favourites_and_reblogs_share_a_group() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("favourite", "B", Some("S1"), "2024-01-01T11:00:00Z"),
            create_test_notification("reblog", "C", Some("S1"), "2024-01-01T12:00:00Z"),
        ];

        let groups = group_utc(&input);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, GroupKind::FavouriteReblog);
        assert_eq!(account_ids(&groups[0]), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_follow_requests_are_never_merged() {
        let input = vec![
            create_test_notification("follow_request", "A", None, "2024-01-01T10:00:00Z"),
            create_test_notification("follow_request", "A", None, "2024-01-01T10:00:00Z"),
            create_test_notification("follow_request", "A", None, "2024-01-01T10:00:00Z"),
        ];

        let groups = group_utc(&input);

        assert_eq!(groups.len(), 3);
        for group in &groups {
            assert!(group.is_standalone());
            assert_eq!(group.kind, GroupKind::Single(NotificationKind::FollowRequest));
            assert_eq!(group.account.id, "A");
        }
    }

    #[test]
    fn test_follow_request_keeps_its_position() {
        let input = vec![
            create_test_notification("follow", "A", None, "2024-01-01T10:00:00Z"),
            create_test_notification("follow_request", "B", None, "2024-01-01T10:30:00Z"),
            create_test_notification("follow", "C", None, "2024-01-01T11:00:00Z"),
        ];

        let groups = group_utc(&input);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, GroupKind::Single(NotificationKind::Follow));
        assert_eq!(account_ids(&groups[0]), vec!["A", "C"]);
        assert_eq!(groups[1].kind, GroupKind::Single(NotificationKind::FollowRequest));
    }

    #[test]
    fn test_repeat_actor_gains_types_in_descending_order() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("reblog", "A", Some("S1"), "2024-01-01T10:01:00Z"),
        ];

        let groups = group_utc(&input);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].accounts.len(), 1);
        assert_eq!(
            groups[0].accounts[0].types,
            vec![NotificationKind::Reblog, NotificationKind::Favourite]
        );
    }

    #[test]
    fn test_types_are_resorted_on_every_addition() {
        // Arrival order is reblog, favourite, reblog.
        let input = vec![
            create_test_notification("reblog", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:01:00Z"),
            create_test_notification("reblog", "A", Some("S1"), "2024-01-01T10:02:00Z"),
        ];

        let groups = group_utc(&input);

        assert_eq!(
            groups[0].accounts[0].types,
            vec![
                NotificationKind::Reblog,
                NotificationKind::Reblog,
                NotificationKind::Favourite
            ]
        );
    }

    #[test]
    fn test_day_boundary_splits_groups() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T23:00:00Z"),
            create_test_notification("favourite", "B", Some("S1"), "2024-01-02T01:00:00Z"),
        ];

        let groups = group_utc(&input);
        assert_eq!(groups.len(), 2);

        // Two hours behind UTC both land on January 1st.
        let groups = aggregate_in(&input, "-02:00".parse().unwrap());
        assert_eq!(groups.len(), 1);
        assert_eq!(account_ids(&groups[0]), vec!["A", "B"]);
    }

    #[test]
    fn test_statusless_follows_merge() {
        let input = vec![
            create_test_notification("follow", "A", None, "2024-01-01T10:00:00Z"),
            create_test_notification("follow", "B", None, "2024-01-01T18:00:00Z"),
        ];

        let groups = group_utc(&input);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, GroupKind::Single(NotificationKind::Follow));
        assert_eq!(groups[0].accounts.len(), 2);
        assert!(groups[0].status.is_none());
    }

    #[test]
    fn test_different_statuses_and_types_stay_apart() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("favourite", "A", Some("S2"), "2024-01-01T10:00:00Z"),
            create_test_notification("mention", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("poll", "A", Some("S1"), "2024-01-01T10:00:00Z"),
        ];

        let groups = group_utc(&input);
        assert_eq!(groups.len(), 4);
    }

    #[test]
    fn test_output_follows_first_occurrence() {
        let input = vec![
            create_test_notification("mention", "A", Some("S2"), "2024-01-01T12:00:00Z"),
            create_test_notification("favourite", "B", Some("S1"), "2024-01-01T11:00:00Z"),
            create_test_notification("mention", "C", Some("S2"), "2024-01-01T10:00:00Z"),
            create_test_notification("reblog", "D", Some("S1"), "2024-01-01T09:00:00Z"),
        ];

        let groups = group_utc(&input);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, GroupKind::Single(NotificationKind::Mention));
        assert_eq!(account_ids(&groups[0]), vec!["A", "C"]);
        assert_eq!(groups[1].kind, GroupKind::FavouriteReblog);
        assert_eq!(account_ids(&groups[1]), vec!["B", "D"]);
    }

    #[test]
    fn test_representative_is_first_notification() {
        let input = vec![
            create_test_notification("reblog", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("favourite", "B", Some("S1"), "2024-01-01T11:00:00Z"),
        ];

        let groups = group_utc(&input);

        assert_eq!(groups[0].id, input[0].id);
        assert_eq!(groups[0].account.id, "A");
        assert_eq!(groups[0].created_at, input[0].created_at);
    }

    #[test]
    fn test_input_is_left_untouched() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("reblog", "A", Some("S1"), "2024-01-01T10:01:00Z"),
        ];
        let before = input.clone();

        let _ = group_utc(&input);

        assert_eq!(input, before);
    }

    #[test]
    fn test_scenario_output_shape() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("reblog", "B", Some("S1"), "2024-01-01T11:00:00Z"),
            create_test_notification("follow_request", "C", None, "2024-01-01T12:00:00Z"),
        ];

        let groups = group_utc(&input);
        let json = serde_json::to_value(&groups).unwrap();

        assert_eq!(json[0]["type"], "favourite+reblog");
        assert_eq!(
            json[0]["accounts"],
            serde_json::json!([
                {"id": "A", "types": ["favourite"]},
                {"id": "B", "types": ["reblog"]}
            ])
        );
        assert_eq!(json[1]["type"], "follow_request");
        assert_eq!(json[1]["account"]["id"], "C");
        assert!(json[1].get("accounts").is_none());
    }

    #[test]
    fn test_unknown_types_group_by_name() {
        let input = vec![
            create_test_notification("quote", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("quote", "B", Some("S1"), "2024-01-01T11:00:00Z"),
        ];

        let groups = group_utc(&input);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind.as_str(), "quote");
    }

    #[test]
    fn test_aggregate_uses_local_days() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("reblog", "B", Some("S1"), "2024-01-01T10:05:00Z"),
        ];

        let groups = aggregate(&input);

        assert_eq!(groups, aggregate_in(&input, DayZone::Local));
        assert_eq!(groups.len(), 1);
        assert_eq!(account_ids(&groups[0]), vec!["A", "B"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_utc(&[]).is_empty());
        let aggregation = Aggregator::default().aggregate(&[]).unwrap();
        assert!(aggregation.groups.is_empty());
        assert!(aggregation.skipped.is_empty());
    }

    #[test]
    fn test_aggregator_skips_malformed_records() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("favourite", "", Some("S1"), "2024-01-01T10:01:00Z"),
            create_test_notification("", "B", Some("S1"), "2024-01-01T10:02:00Z"),
            create_test_notification("reblog", "C", Some("S1"), "2024-01-01T10:03:00Z"),
        ];

        let aggregator = Aggregator::new(DayZone::utc(), MalformedPolicy::Skip);
        let aggregation = aggregator.aggregate(&input).unwrap();

        assert_eq!(aggregation.groups.len(), 1);
        assert_eq!(account_ids(&aggregation.groups[0]), vec!["A", "C"]);
        assert_eq!(aggregation.skipped.len(), 2);
        assert_eq!(aggregation.skipped[0].index, 1);
        assert_eq!(aggregation.skipped[0].reason, "account id is empty");
        assert_eq!(aggregation.skipped[1].index, 2);
        assert_eq!(aggregation.skipped[1].reason, "notification type is empty");
    }

    #[test]
    fn test_aggregator_fails_fast_when_strict() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("favourite", "", Some("S1"), "2024-01-01T10:01:00Z"),
        ];

        let aggregator = Aggregator::new(DayZone::utc(), MalformedPolicy::Fail);
        let err = aggregator.aggregate(&input).unwrap_err();

        assert!(matches!(
            err,
            GroupingError::Malformed {
                index: 1,
                reason: Malformation::EmptyAccountId
            }
        ));
    }

    #[test]
    fn test_aggregator_matches_plain_aggregation_on_clean_input() {
        let input = vec![
            create_test_notification("favourite", "A", Some("S1"), "2024-01-01T10:00:00Z"),
            create_test_notification("follow", "B", None, "2024-01-01T10:00:00Z"),
            create_test_notification("reblog", "C", Some("S1"), "2024-01-01T10:00:00Z"),
        ];

        let aggregator = Aggregator::new(DayZone::utc(), MalformedPolicy::Fail);
        let aggregation = aggregator.aggregate(&input).unwrap();

        assert_eq!(aggregation.groups, group_utc(&input));
    }
}
