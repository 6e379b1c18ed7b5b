//! Notification feed, admin user directory and the account page.

use std::cmp::Reverse;

use crate::aggregate::{by_field, count_where, frequency};
use crate::binding::{ChartBinding, ChartKind, TableBinding, ViewModel};
use crate::pagination::Paginator;
use crate::record::Record;

use super::{sort_records, Resource, ResourceSet, ViewParams};

/// Columns the user directory can be sorted by.
const USER_SORT_KEYS: [&str; 4] = ["id", "name", "email", "role"];

/// Unread notifications. A missing `read` flag counts as unread.
pub fn unread_count(records: &[Record]) -> u64 {
    count_where(records, |r| !r.flag("read"))
}

pub(super) fn notifications(data: &ResourceSet) -> ViewModel {
    let mut feed = data.get(Resource::Notifications).to_vec();
    // Newest first; undated entries last
    feed.sort_by_cached_key(|r| {
        let ts = r.timestamp("timestamp");
        (ts.is_none(), Reverse(ts))
    });

    ViewModel::new("Notifications")
        .stat("Unread", unread_count(&feed))
        .stat("Total", feed.len())
        .chart(ChartBinding::single(
            "notification_types",
            "Notification Types",
            ChartKind::Doughnut,
            "Notifications",
            &frequency(&feed, by_field("type")),
        ))
        .table(TableBinding::from_page(
            "feed",
            "Notifications",
            &["title", "message", "type", "read", "timestamp"],
            Paginator::with_size(feed.len()).page(&feed),
        ))
}

/// User table filtered by `search` on name or email, sorted by `sort`
/// (`id` by default) in `order`.
pub(super) fn user_directory(data: &ResourceSet, params: &ViewParams) -> ViewModel {
    let users = data.get(Resource::Users);

    let needle = params.needle();
    let mut listed: Vec<Record> = users
        .iter()
        .filter(|r| match &needle {
            Some(n) => ["name", "email"].iter().any(|field| {
                r.text(field)
                    .is_some_and(|v| v.to_lowercase().contains(n.as_str()))
            }),
            None => true,
        })
        .cloned()
        .collect();

    let key = params
        .sort
        .as_deref()
        .and_then(|s| USER_SORT_KEYS.iter().find(|k| **k == s))
        .copied()
        .unwrap_or(USER_SORT_KEYS[0]);
    sort_records(&mut listed, key, params.order);

    ViewModel::new("User Directory")
        .stat("Users", users.len())
        .stat(
            "Admins",
            count_where(users, |r| r.text("role").as_deref() == Some("admin")),
        )
        .chart(ChartBinding::single(
            "user_roles",
            "User Roles",
            ChartKind::Pie,
            "Users",
            &frequency(users, by_field("role")),
        ))
        .table(TableBinding::from_page(
            "users",
            "Users",
            &USER_SORT_KEYS,
            params.paginator().page(&listed),
        ))
}

/// Fields shown on the account page, with their labels.
const ACCOUNT_FIELDS: [(&str, &str); 4] = [
    ("id", "User ID"),
    ("name", "Name"),
    ("email", "Email"),
    ("role", "Role"),
];

/// The signed-in user's own record. Absent fields show as `null`.
pub(super) fn account(data: &ResourceSet) -> ViewModel {
    let Some(user) = data.get(Resource::Account).first() else {
        return ViewModel::new("My Account").stat("Found", false);
    };

    ACCOUNT_FIELDS.iter().fold(
        ViewModel::new("My Account").stat("Found", true),
        |model, (field, label)| model.stat(*label, user.text(field)),
    )
}
