//! Caller-facing facade over the to-do [`Store`].
//!
//! Each operation sends one command, waits for its whole effect cascade to
//! settle, and reads the outcome off the actions that cascade fed back.
//! Overlapping calls on one session each see only their own results.

use crate::collection::RemoteAccessError;
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{Identity, ItemId, Mutation, Notice, TodoAction, TodoItem, TodoState, ViewMode};
use std::time::Duration;
use thiserror::Error;
use todoboard_runtime::{Store, StoreError};

/// Capacity of the action broadcast shared by all in-flight calls
///
/// Outcomes are not read from the broadcast, so a lagging subscriber only
/// loses its own view.
const BROADCAST_CAPACITY: usize = 256;

/// Errors returned by [`TodoStore`] operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// The remote collection call failed
    #[error(transparent)]
    Remote(#[from] RemoteAccessError),

    /// The runtime refused the command
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a toggle or delete that did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Cache and remote record were changed
    Applied,
    /// The user does not own the item; a notice was raised
    Rejected(Notice),
    /// Nothing to do: no identity, or the item is not cached
    Skipped,
}

/// To-do list session
#[derive(Clone)]
pub struct TodoStore {
    store: Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>,
}

impl TodoStore {
    /// Create a session with an empty cache in normal mode
    #[must_use]
    pub fn new(environment: TodoEnvironment) -> Self {
        Self {
            store: Store::with_broadcast_capacity(
                TodoState::new(),
                TodoReducer::new(),
                environment,
                BROADCAST_CAPACITY,
            ),
        }
    }

    /// Heading of the list for `identity`
    #[must_use]
    pub fn title(identity: &Identity) -> String {
        format!("{}'s Todo List", identity.display_name)
    }

    /// Reload the cache for the current mode and return it
    ///
    /// Without an identity nothing is fetched and the result is empty.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Remote`] if the query fails; the cache keeps its
    /// previous content.
    #[tracing::instrument(skip_all)]
    pub async fn list_items(&self, identity: Option<&Identity>) -> Result<Vec<TodoItem>, TodoError> {
        let Some(identity) = identity else {
            return Ok(Vec::new());
        };

        let observed = self
            .store
            .send_and_settle(TodoAction::LoadItems {
                identity: Some(identity.clone()),
            })
            .await?;
        Self::load_outcome(&observed)?;

        Ok(self.items().await)
    }

    /// Create an item with `text`
    ///
    /// Returns `None` if `text` is blank or there is no identity.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Remote`] if the insert fails; cache and draft are
    /// left as they were.
    #[tracing::instrument(skip_all)]
    pub async fn create_item(
        &self,
        identity: Option<&Identity>,
        text: &str,
    ) -> Result<Option<TodoItem>, TodoError> {
        let observed = self
            .store
            .send_and_settle(TodoAction::CreateItem {
                identity: identity.cloned(),
                text: text.to_string(),
            })
            .await?;

        for action in observed {
            match action {
                TodoAction::ItemCreated { item } => return Ok(Some(item)),
                TodoAction::CreateFailed { error } => return Err(error.into()),
                _ => {},
            }
        }
        Ok(None)
    }

    /// Flip the completion of an item the user owns
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Remote`] if the ownership read or the write fails.
    /// A failed write is rolled back in the cache.
    #[tracing::instrument(skip(self, identity))]
    pub async fn toggle_item(
        &self,
        identity: Option<&Identity>,
        id: &ItemId,
    ) -> Result<MutationOutcome, TodoError> {
        let observed = self
            .store
            .send_and_settle(TodoAction::ToggleItem {
                identity: identity.cloned(),
                id: id.clone(),
            })
            .await?;
        Self::mutation_outcome(&observed, id, Mutation::Toggle)
    }

    /// Delete an item the user owns
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Remote`] if the ownership read or the delete
    /// fails. A failed delete puts the item back at its old position.
    #[tracing::instrument(skip(self, identity))]
    pub async fn delete_item(
        &self,
        identity: Option<&Identity>,
        id: &ItemId,
    ) -> Result<MutationOutcome, TodoError> {
        let observed = self
            .store
            .send_and_settle(TodoAction::DeleteItem {
                identity: identity.cloned(),
                id: id.clone(),
            })
            .await?;
        Self::mutation_outcome(&observed, id, Mutation::Delete)
    }

    /// Switch between normal and admin mode, returning the mode now in effect
    ///
    /// Entering admin mode requires an allow-listed display name; otherwise
    /// [`Notice::NotAnAdmin`] is raised and the mode stays normal.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Remote`] if the reload after a mode change fails.
    /// The mode change itself is kept.
    #[tracing::instrument(skip_all)]
    pub async fn toggle_mode(&self, identity: Option<&Identity>) -> Result<ViewMode, TodoError> {
        let observed = self
            .store
            .send_and_settle(TodoAction::ToggleMode {
                identity: identity.cloned(),
            })
            .await?;
        Self::load_outcome(&observed)?;

        Ok(self.mode().await)
    }

    /// Replace the draft text
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Store`] if the session is shutting down.
    pub async fn set_draft(&self, text: impl Into<String>) -> Result<(), TodoError> {
        self.store
            .send(TodoAction::SetDraft { text: text.into() })
            .await?;
        Ok(())
    }

    /// Create an item from the current draft
    ///
    /// # Errors
    ///
    /// Same as [`TodoStore::create_item`].
    pub async fn submit_draft(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Option<TodoItem>, TodoError> {
        let draft = self.draft().await;
        self.create_item(identity, &draft).await
    }

    /// Snapshot of the cached items
    pub async fn items(&self) -> Vec<TodoItem> {
        self.store.state(|s| s.items.clone()).await
    }

    /// Current view mode
    pub async fn mode(&self) -> ViewMode {
        self.store.state(|s| s.mode).await
    }

    /// Current draft text
    pub async fn draft(&self) -> String {
        self.store.state(|s| s.draft.clone()).await
    }

    /// Last recorded remote failure
    pub async fn last_error(&self) -> Option<RemoteAccessError> {
        self.store.state(|s| s.last_error.clone()).await
    }

    /// Read and dismiss the pending notice
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Store`] if the session is shutting down.
    pub async fn take_notice(&self) -> Result<Option<Notice>, TodoError> {
        let notice = self.store.state(|s| s.notice).await;
        if notice.is_some() {
            self.store.send(TodoAction::DismissNotice).await?;
        }
        Ok(notice)
    }

    /// Stop accepting commands and wait for in-flight remote calls
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Store`] if calls are still running at `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), TodoError> {
        self.store.shutdown(timeout).await?;
        Ok(())
    }

    fn load_outcome(observed: &[TodoAction]) -> Result<(), TodoError> {
        observed
            .iter()
            .find_map(|action| match action {
                TodoAction::LoadFailed { error } => Some(Err(error.clone().into())),
                _ => None,
            })
            .unwrap_or(Ok(()))
    }

    fn mutation_outcome(
        observed: &[TodoAction],
        id: &ItemId,
        mutation: Mutation,
    ) -> Result<MutationOutcome, TodoError> {
        let mut outcome = MutationOutcome::Skipped;

        for action in observed {
            match action {
                TodoAction::OwnershipChecked {
                    id: checked,
                    mutation: pending,
                    owned: false,
                } if checked == id && *pending == mutation => {
                    outcome = MutationOutcome::Rejected(mutation.rejection());
                },
                TodoAction::OwnershipCheckFailed {
                    id: checked,
                    mutation: pending,
                    error,
                } if checked == id && *pending == mutation => return Err(error.clone().into()),
                TodoAction::ItemToggled { id: done, .. } if done == id => {
                    outcome = MutationOutcome::Applied;
                },
                TodoAction::ItemDeleted { id: done } if done == id => {
                    outcome = MutationOutcome::Applied;
                },
                TodoAction::ToggleFailed { id: failed, error, .. }
                | TodoAction::DeleteFailed { id: failed, error, .. }
                    if failed == id =>
                {
                    return Err(error.clone().into());
                },
                _ => {},
            }
        }

        Ok(outcome)
    }
}
