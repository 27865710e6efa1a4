//! Statistics over grouped notifications.

use crate::models::{Account, AccountActivity, GroupedNotification};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Number of raw notifications represented by `groups`.
pub fn represented_count(groups: &[GroupedNotification]) -> usize {
    groups.iter().map(|g| g.notification_count()).sum()
}

/// The `n` accounts with the most contributions, busiest first.
///
/// Ties keep the order in which accounts first appear.
pub fn most_active_accounts(groups: &[GroupedNotification], n: usize) -> Vec<AccountActivity> {
    let mut contributions: Vec<(&Account, usize)> = Vec::new();
    for group in groups {
        if group.is_standalone() {
            contributions.push((&group.account, 1));
        } else {
            for grouped in &group.accounts {
                contributions.push((&grouped.account, grouped.types.len()));
            }
        }
    }

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut activity: Vec<AccountActivity> = Vec::new();

    for (account, count) in contributions {
        match positions.get(account.id.as_str()) {
            Some(&position) => activity[position].notifications += count,
            None => {
                positions.insert(account.id.as_str(), activity.len());
                activity.push(AccountActivity {
                    account: account.clone(),
                    notifications: count,
                });
            }
        }
    }

    // Stable sort, so ties stay in first-seen order
    activity.sort_by_key(|a| Reverse(a.notifications));
    activity.truncate(n);
    activity
}

/// The `n` groups with the most accounts, largest first.
pub fn largest_groups(groups: &[GroupedNotification], n: usize) -> Vec<&GroupedNotification> {
    let mut sorted: Vec<&GroupedNotification> = groups.iter().collect();
    sorted.sort_by_key(|g| Reverse(g.accounts.len()));
    sorted.truncate(n);
    sorted
}
