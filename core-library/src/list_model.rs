//! List model capability
//!
//! The contract a presentation layer binds to: a row count, per-row values
//! looked up by role key, and synchronous change notifications.
//!
//! ## Notification protocol
//!
//! Structural changes are bracketed: `RowsAboutToBeInserted` is delivered
//! before storage changes and `RowsInserted` after it (same for removal).
//! In-place updates emit a single `DataChanged`. All ranges are inclusive
//! row indices.
//!
//! Listeners run on the caller's thread, in subscription order, before the
//! mutating call returns. Models are not shared across threads while being
//! mutated; results computed elsewhere must be handed back to the owner first.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::models::SortOrder;

/// A change notification emitted by a list model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ModelChange {
    RowsAboutToBeInserted { first: usize, last: usize },
    RowsInserted { first: usize, last: usize },
    RowsAboutToBeRemoved { first: usize, last: usize },
    RowsRemoved { first: usize, last: usize },
    DataChanged { first: usize, last: usize },
    SortOrderChanged { order: SortOrder },
}

impl ModelChange {
    /// Inclusive row range touched by this change, if it has one.
    pub fn range(&self) -> Option<(usize, usize)> {
        match *self {
            ModelChange::RowsAboutToBeInserted { first, last }
            | ModelChange::RowsInserted { first, last }
            | ModelChange::RowsAboutToBeRemoved { first, last }
            | ModelChange::RowsRemoved { first, last }
            | ModelChange::DataChanged { first, last } => Some((first, last)),
            ModelChange::SortOrderChanged { .. } => None,
        }
    }
}

/// Value of one role of one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RoleValue {
    Int(i64),
    Float(f64),
    Text(String),
    Url(Option<Url>),
}

impl RoleValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RoleValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RoleValue::Float(value) => Some(*value),
            RoleValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RoleValue::Text(value) => Some(value),
            RoleValue::Url(Some(url)) => Some(url.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for RoleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleValue::Int(value) => write!(f, "{}", value),
            RoleValue::Float(value) => write!(f, "{}", value),
            RoleValue::Text(value) => f.write_str(value),
            RoleValue::Url(Some(url)) => f.write_str(url.as_str()),
            RoleValue::Url(None) => Ok(()),
        }
    }
}

/// Handle returned by [`ListModel::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

/// Callback invoked for every change notification.
pub type ChangeListener = Box<dyn Fn(&ModelChange) + Send + Sync>;

/// Row-oriented model a view can bind to.
pub trait ListModel {
    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Role keys exposed per row, in display order.
    fn role_names(&self) -> &'static [&'static str];

    /// Value of `key` for `row`, or `None` for an unknown key or row.
    fn data(&self, row: usize, key: &str) -> Option<RoleValue>;

    /// All roles of `row` as a key/value map.
    fn row_data(&self, row: usize) -> Option<BTreeMap<&'static str, RoleValue>> {
        if row >= self.row_count() {
            return None;
        }
        self.role_names()
            .iter()
            .map(|key| self.data(row, key).map(|value| (*key, value)))
            .collect()
    }

    /// Register a listener. It receives every subsequent change.
    fn subscribe(&mut self, listener: ChangeListener) -> SubscriptionId;

    /// Remove a listener; returns `false` if the id was unknown.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// Subscriber list shared by model implementations.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, ChangeListener)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: ChangeListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn notify(&self, change: ModelChange) {
        for (_, listener) in &self.entries {
            listener(&change);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
