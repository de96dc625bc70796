//! Domain types for the to-do list.
//!
//! A list is a cache of [`TodoItem`]s mirrored from the remote collection,
//! plus the view state around it: the draft being typed, the visibility
//! mode, and the last notice or remote failure shown to the user.

use crate::collection::RemoteAccessError;
use crate::config::TimestampZone;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a stored to-do item, assigned by the remote collection
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wrap a collection-assigned id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an authenticated user
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an id supplied by the authentication provider
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The signed-in user, as reported by the authentication provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id; owner key of every item the user creates
    pub user_id: UserId,
    /// Name shown in the UI; also the key checked against the admin allow-list
    pub display_name: String,
}

impl Identity {
    /// Creates an identity
    #[must_use]
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            display_name: display_name.into(),
        }
    }
}

/// Creation timestamp, stored as `YYYY-MM-DD HH:MM:SS`
///
/// The fixed-width format makes string order equal to time order, which is
/// what the remote ordering relies on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatedAt(String);

impl CreatedAt {
    /// `strftime` format of the stored timestamp
    pub const FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    /// Stamp `now` at second precision in the given zone, without an offset
    #[must_use]
    pub fn stamp(now: DateTime<Utc>, zone: TimestampZone) -> Self {
        let text = match zone {
            TimestampZone::Utc => now.format(Self::FORMAT).to_string(),
            TimestampZone::Local => now.with_timezone(&Local).format(Self::FORMAT).to_string(),
        };
        Self(text)
    }

    /// Wrap an already formatted timestamp
    #[must_use]
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the stored text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse back into a naive date-time, if well formed
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.0, Self::FORMAT).ok()
    }
}

impl fmt::Display for CreatedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single to-do item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Unique identifier
    pub id: ItemId,
    /// User who created the item; the only one allowed to change it
    pub owner_id: UserId,
    /// What to do
    pub text: String,
    /// Whether the item is done
    pub completed: bool,
    /// When the item was created
    pub created_at: CreatedAt,
}

impl TodoItem {
    /// Creates a new, not yet completed item
    #[must_use]
    pub const fn new(id: ItemId, owner_id: UserId, text: String, created_at: CreatedAt) -> Self {
        Self {
            id,
            owner_id,
            text,
            completed: false,
            created_at,
        }
    }

    /// Whether `user` owns this item
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }
}

/// Which items the session sees
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewMode {
    /// Only the signed-in user's items
    #[default]
    Normal,
    /// Every user's items (read-only for items of others)
    Admin,
}

impl ViewMode {
    /// Label of the mode toggle button
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "일반모드",
            Self::Admin => "관리자모드",
        }
    }
}

/// Blocking notice shown to the user after a refused action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notice {
    /// Toggle attempted on an item owned by someone else
    CannotToggleOthersItem,
    /// Delete attempted on an item owned by someone else
    CannotDeleteOthersItem,
    /// Admin mode requested by a user outside the allow-list
    NotAnAdmin,
}

impl Notice {
    /// Text shown to the user
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::CannotToggleOthersItem => "Can't toggle other's Todo",
            Self::CannotDeleteOthersItem => "Can't delete other's todo",
            Self::NotAnAdmin => "Not an admin user",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Mutation guarded by an ownership check
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mutation {
    /// Flip `completed`
    Toggle,
    /// Remove the item
    Delete,
}

impl Mutation {
    /// Notice raised when the check fails
    #[must_use]
    pub const fn rejection(self) -> Notice {
        match self {
            Self::Toggle => Notice::CannotToggleOthersItem,
            Self::Delete => Notice::CannotDeleteOthersItem,
        }
    }
}

/// View state of the to-do list
///
/// `items` mirrors the remote collection as of the last full load, patched by
/// every create, toggle and delete since.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TodoState {
    /// Cached items, in display order
    pub items: Vec<TodoItem>,
    /// Text currently in the input box
    pub draft: String,
    /// Visibility mode; resets to `Normal` with every new session
    pub mode: ViewMode,
    /// Pending notice, if any
    pub notice: Option<Notice>,
    /// Last remote failure, cleared by the next successful load or create
    pub last_error: Option<RemoteAccessError>,
}

impl TodoState {
    /// Creates a new empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached items
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of completed items
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.completed).count()
    }

    /// Returns a cached item by id
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&TodoItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Position of an item in the cache
    #[must_use]
    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }
}

/// Actions for the to-do list: user intents and the results of remote calls
#[derive(Clone, Debug, PartialEq)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Reload the cache for the current mode
    LoadItems {
        /// Signed-in user, if any
        identity: Option<Identity>,
    },

    /// Input box changed
    SetDraft {
        /// New draft text
        text: String,
    },

    /// Create an item with `text`
    CreateItem {
        /// Signed-in user, if any
        identity: Option<Identity>,
        /// Item text
        text: String,
    },

    /// Flip an item's completion
    ToggleItem {
        /// Signed-in user, if any
        identity: Option<Identity>,
        /// Item to flip
        id: ItemId,
    },

    /// Delete an item
    DeleteItem {
        /// Signed-in user, if any
        identity: Option<Identity>,
        /// Item to delete
        id: ItemId,
    },

    /// Switch between normal and admin mode
    ToggleMode {
        /// Signed-in user, if any
        identity: Option<Identity>,
    },

    /// Clear the current notice
    DismissNotice,

    // ========== Remote results ==========
    /// A load finished
    ItemsLoaded {
        /// Mode the load was issued for
        mode: ViewMode,
        /// Items, oldest first
        items: Vec<TodoItem>,
    },

    /// A load failed
    LoadFailed {
        /// Failure
        error: RemoteAccessError,
    },

    /// The remote collection stored a new item
    ItemCreated {
        /// Stored item with its assigned id
        item: TodoItem,
    },

    /// Storing a new item failed
    CreateFailed {
        /// Failure
        error: RemoteAccessError,
    },

    /// Fresh ownership read finished
    OwnershipChecked {
        /// Item the mutation targets
        id: ItemId,
        /// Mutation waiting on the check
        mutation: Mutation,
        /// Whether the user owns the item
        owned: bool,
    },

    /// Ownership read failed
    OwnershipCheckFailed {
        /// Item the mutation targets
        id: ItemId,
        /// Mutation waiting on the check
        mutation: Mutation,
        /// Failure
        error: RemoteAccessError,
    },

    /// The remote record now has the flipped value
    ItemToggled {
        /// Toggled item
        id: ItemId,
        /// Value written
        completed: bool,
    },

    /// Writing the flipped value failed
    ToggleFailed {
        /// Item whose flip is rolled back
        id: ItemId,
        /// Value to restore
        previous: bool,
        /// Failure
        error: RemoteAccessError,
    },

    /// The remote record is gone
    ItemDeleted {
        /// Deleted item
        id: ItemId,
    },

    /// Deleting the remote record failed
    DeleteFailed {
        /// Item whose removal is rolled back
        id: ItemId,
        /// Cache slot and item to put back, if it was cached
        restore: Option<(usize, TodoItem)>,
        /// Failure
        error: RemoteAccessError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, completed: bool) -> TodoItem {
        TodoItem {
            completed,
            ..TodoItem::new(
                ItemId::new(id),
                UserId::new("u1"),
                "text".to_string(),
                CreatedAt::from_raw("2025-01-01 00:00:00"),
            )
        }
    }

    #[test]
    fn created_at_formats_without_offset() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 7, 5, 1).unwrap();
        let stamp = CreatedAt::stamp(now, TimestampZone::Utc);
        assert_eq!(stamp.as_str(), "2025-03-09 07:05:01");
        assert_eq!(stamp.to_naive(), Some(now.naive_utc()));
    }

    #[test]
    fn created_at_string_order_is_time_order() {
        let earlier = CreatedAt::from_raw("2025-01-09 23:59:59");
        let later = CreatedAt::from_raw("2025-01-10 00:00:00");
        assert!(earlier < later);
    }

    #[test]
    fn local_stamp_parses_back() {
        let stamp = CreatedAt::stamp(Utc::now(), TimestampZone::Local);
        assert!(stamp.to_naive().is_some());
    }

    #[test]
    fn view_mode_labels() {
        assert_eq!(ViewMode::default(), ViewMode::Normal);
        assert_eq!(ViewMode::Normal.label(), "일반모드");
        assert_eq!(ViewMode::Admin.label(), "관리자모드");
    }

    #[test]
    fn mutation_rejection_notices() {
        assert_eq!(Mutation::Toggle.rejection().to_string(), "Can't toggle other's Todo");
        assert_eq!(Mutation::Delete.rejection().to_string(), "Can't delete other's todo");
        assert_eq!(Notice::NotAnAdmin.to_string(), "Not an admin user");
    }

    #[test]
    fn todo_state_counts() {
        let mut state = TodoState::new();
        assert_eq!(state.count(), 0);

        state.items.push(item("a", false));
        state.items.push(item("b", true));

        assert_eq!(state.count(), 2);
        assert_eq!(state.completed_count(), 1);
        assert_eq!(state.position(&ItemId::new("b")), Some(1));
        assert!(state.get(&ItemId::new("c")).is_none());
    }
}
