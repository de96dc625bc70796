//! Reducer logic for the to-do list.
//!
//! Commands validate locally and describe remote calls as effects; the
//! results come back as actions and patch the cache. Toggle and delete are
//! applied to the cache before the remote write and rolled back if it fails.

use crate::collection::{Direction, DocumentCollection, Query, RemoteAccessError};
use crate::config::TodoConfig;
use crate::record::{self, CREATED_AT_FIELD, OWNER_FIELD};
use crate::types::{
    CreatedAt, Identity, ItemId, Mutation, Notice, TodoAction, TodoItem, TodoState, ViewMode,
};
use std::sync::Arc;
use todoboard_core::{
    async_effect, effect::Effect, environment::Clock, reducer::Reducer, remote_effect, smallvec,
    SmallVec,
};

type Effects = SmallVec<[Effect<TodoAction>; 4]>;

/// Environment dependencies for the to-do reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for creation timestamps
    pub clock: Arc<dyn Clock>,
    /// Remote collection holding the items
    pub collection: Arc<dyn DocumentCollection>,
    /// Admin allow-list and timestamp zone
    pub config: Arc<TodoConfig>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        collection: Arc<dyn DocumentCollection>,
        config: Arc<TodoConfig>,
    ) -> Self {
        Self {
            clock,
            collection,
            config,
        }
    }
}

/// Reducer for the to-do list
#[derive(Clone, Debug)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Query backing a listing in `mode`, oldest first
    fn listing_query(identity: &Identity, mode: ViewMode) -> Query {
        let query = match mode {
            ViewMode::Normal => Query::all().where_eq(OWNER_FIELD, identity.user_id.as_str()),
            ViewMode::Admin => Query::all(),
        };
        query.order_by(CREATED_AT_FIELD, Direction::Ascending)
    }

    fn load(env: &TodoEnvironment, identity: &Identity, mode: ViewMode) -> Effect<TodoAction> {
        let collection = Arc::clone(&env.collection);
        let query = Self::listing_query(identity, mode);

        async_effect! {
            let loaded = collection.query(query).await.and_then(|documents| {
                documents
                    .into_iter()
                    .map(record::decode)
                    .collect::<Result<Vec<TodoItem>, RemoteAccessError>>()
            });

            Some(match loaded {
                Ok(items) => TodoAction::ItemsLoaded { mode, items },
                Err(error) => TodoAction::LoadFailed { error },
            })
        }
    }

    fn create(env: &TodoEnvironment, identity: &Identity, text: String) -> Effect<TodoAction> {
        let owner_id = identity.user_id.clone();
        let created_at = CreatedAt::stamp(env.clock.now(), env.config.timestamp_zone);

        let fields = match record::new_item_fields(&owner_id, &text, &created_at) {
            Ok(fields) => fields,
            Err(error) => return async_effect! { Some(TodoAction::CreateFailed { error }) },
        };
        let collection = Arc::clone(&env.collection);

        remote_effect! {
            call: collection.insert(fields),
            on_success: |id| Some(TodoAction::ItemCreated {
                item: TodoItem::new(ItemId::new(id), owner_id, text, created_at),
            }),
            on_error: |error| Some(TodoAction::CreateFailed { error })
        }
    }

    /// Fresh read of the user's own ids; the cache is never trusted for this
    fn check_ownership(
        env: &TodoEnvironment,
        identity: &Identity,
        id: ItemId,
        mutation: Mutation,
    ) -> Effect<TodoAction> {
        let collection = Arc::clone(&env.collection);
        let query = Query::all().where_eq(OWNER_FIELD, identity.user_id.as_str());

        remote_effect! {
            call: collection.query(query),
            on_success: |documents| {
                let owned = documents.iter().any(|doc| doc.id == id.as_str());
                Some(TodoAction::OwnershipChecked { id, mutation, owned })
            },
            on_error: |error| Some(TodoAction::OwnershipCheckFailed { id, mutation, error })
        }
    }

    fn toggle(state: &mut TodoState, env: &TodoEnvironment, id: ItemId) -> Effects {
        let Some(item) = state.items.iter_mut().find(|item| item.id == id) else {
            tracing::debug!(id = %id, "Owned item is not cached, nothing to toggle");
            return SmallVec::new();
        };

        let previous = item.completed;
        let completed = !previous;
        item.completed = completed;

        let collection = Arc::clone(&env.collection);
        let key = id.as_str().to_owned();

        smallvec![remote_effect! {
            call: collection.update(&key, record::completed_patch(completed)),
            on_success: |()| Some(TodoAction::ItemToggled { id, completed }),
            on_error: |error| Some(TodoAction::ToggleFailed { id, previous, error })
        }]
    }

    fn delete(state: &mut TodoState, env: &TodoEnvironment, id: ItemId) -> Effects {
        let restore = state
            .position(&id)
            .map(|index| (index, state.items.remove(index)));

        let collection = Arc::clone(&env.collection);
        let key = id.as_str().to_owned();

        smallvec![remote_effect! {
            call: collection.delete(&key),
            on_success: |()| Some(TodoAction::ItemDeleted { id }),
            on_error: |error| Some(TodoAction::DeleteFailed { id, restore, error })
        }]
    }

    fn record_failure(state: &mut TodoState, error: RemoteAccessError) {
        tracing::warn!(error = %error, "Remote collection call failed");
        state.last_error = Some(error);
    }
}

impl Default for TodoReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            // ========== Commands ==========
            TodoAction::LoadItems { identity } => match identity {
                Some(identity) => smallvec![Self::load(env, &identity, state.mode)],
                None => SmallVec::new(),
            },

            TodoAction::SetDraft { text } => {
                state.draft = text;
                SmallVec::new()
            },

            TodoAction::CreateItem { identity, text } => {
                let Some(identity) = identity else {
                    return SmallVec::new();
                };
                if text.trim().is_empty() {
                    return SmallVec::new();
                }
                smallvec![Self::create(env, &identity, text)]
            },

            TodoAction::ToggleItem { identity, id } => match identity {
                Some(identity) => {
                    smallvec![Self::check_ownership(env, &identity, id, Mutation::Toggle)]
                },
                None => SmallVec::new(),
            },

            TodoAction::DeleteItem { identity, id } => match identity {
                Some(identity) => {
                    smallvec![Self::check_ownership(env, &identity, id, Mutation::Delete)]
                },
                None => SmallVec::new(),
            },

            TodoAction::ToggleMode { identity } => {
                let Some(identity) = identity else {
                    return SmallVec::new();
                };

                match state.mode {
                    ViewMode::Admin => state.mode = ViewMode::Normal,
                    ViewMode::Normal if env.config.admins.contains(&identity.display_name) => {
                        state.mode = ViewMode::Admin;
                    },
                    ViewMode::Normal => {
                        tracing::info!(user = %identity.user_id, "Admin mode refused");
                        state.notice = Some(Notice::NotAnAdmin);
                        return SmallVec::new();
                    },
                }

                tracing::debug!(user = %identity.user_id, mode = ?state.mode, "View mode changed");
                smallvec![Self::load(env, &identity, state.mode)]
            },

            TodoAction::DismissNotice => {
                state.notice = None;
                SmallVec::new()
            },

            // ========== Remote results ==========
            TodoAction::ItemsLoaded { mode, items } => {
                if mode == state.mode {
                    state.items = items;
                    state.last_error = None;
                } else {
                    tracing::debug!(?mode, current = ?state.mode, "Discarding stale listing");
                }
                SmallVec::new()
            },

            TodoAction::ItemCreated { item } => {
                state.items.insert(0, item);
                state.draft.clear();
                state.last_error = None;
                SmallVec::new()
            },

            TodoAction::OwnershipChecked {
                id,
                mutation,
                owned,
            } => {
                if !owned {
                    tracing::info!(id = %id, ?mutation, "Mutation refused, item is not owned");
                    state.notice = Some(mutation.rejection());
                    return SmallVec::new();
                }
                match mutation {
                    Mutation::Toggle => Self::toggle(state, env, id),
                    Mutation::Delete => Self::delete(state, env, id),
                }
            },

            TodoAction::ItemToggled { id, completed } => {
                if let Some(item) = state.items.iter_mut().find(|item| item.id == id) {
                    item.completed = completed;
                }
                SmallVec::new()
            },

            TodoAction::ToggleFailed {
                id,
                previous,
                error,
            } => {
                tracing::debug!(id = %id, "Rolling back toggle");
                if let Some(item) = state.items.iter_mut().find(|item| item.id == id) {
                    item.completed = previous;
                }
                Self::record_failure(state, error);
                SmallVec::new()
            },

            TodoAction::ItemDeleted { id } => {
                state.items.retain(|item| item.id != id);
                SmallVec::new()
            },

            TodoAction::DeleteFailed { id, restore, error } => {
                tracing::debug!(id = %id, "Rolling back delete");
                if let Some((index, item)) = restore {
                    if state.get(&item.id).is_none() {
                        let index = index.min(state.items.len());
                        state.items.insert(index, item);
                    }
                }
                Self::record_failure(state, error);
                SmallVec::new()
            },

            TodoAction::LoadFailed { error }
            | TodoAction::CreateFailed { error }
            | TodoAction::OwnershipCheckFailed { error, .. } => {
                Self::record_failure(state, error);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)] // Test code can panic
mod tests {
    use super::*;
    use crate::collection::{Fields, InMemoryCollection, Operation};
    use crate::config::TimestampZone;
    use crate::types::UserId;
    use proptest::prelude::*;
    use todoboard_testing::{assertions, drain_effects, test_clock, ReducerTest};

    fn test_config() -> TodoConfig {
        TodoConfig {
            timestamp_zone: TimestampZone::Utc,
            ..TodoConfig::default()
        }
    }

    fn create_test_env() -> TodoEnvironment {
        create_test_env_with(Arc::new(InMemoryCollection::new("todos")))
    }

    fn create_test_env_with(collection: Arc<InMemoryCollection>) -> TodoEnvironment {
        TodoEnvironment::new(Arc::new(test_clock()), collection, Arc::new(test_config()))
    }

    fn alice() -> Identity {
        Identity::new("u1", "Alice")
    }

    fn admin() -> Identity {
        Identity::new("u9", "김진중")
    }

    fn item(id: &str, owner: &str, completed: bool) -> TodoItem {
        TodoItem {
            completed,
            ..TodoItem::new(
                ItemId::new(id),
                UserId::new(owner),
                format!("item {id}"),
                CreatedAt::from_raw("2025-01-01 00:00:00"),
            )
        }
    }

    fn state_with(items: Vec<TodoItem>) -> TodoState {
        TodoState {
            items,
            ..TodoState::new()
        }
    }

    async fn seed(collection: &InMemoryCollection, owner: &str, text: &str, at: &str) -> String {
        let fields: Fields = record::new_item_fields(
            &UserId::new(owner),
            text,
            &CreatedAt::from_raw(at),
        )
        .unwrap();
        collection.insert(fields).await.unwrap()
    }

    #[test]
    fn test_set_draft() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::SetDraft {
                text: "buy milk".into(),
            })
            .then_state(|state| assert_eq!(state.draft, "buy milk"))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_create_blank_text_is_noop() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                draft: "   ".into(),
                ..TodoState::new()
            })
            .when_action(TodoAction::CreateItem {
                identity: Some(alice()),
                text: " \t ".into(),
            })
            .then_state(|state| {
                assert_eq!(state.count(), 0);
                assert_eq!(state.draft, "   ");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_create_issues_insert() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::CreateItem {
                identity: Some(alice()),
                text: "buy milk".into(),
            })
            .then_state(|state| assert_eq!(state.count(), 0))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_create_stamps_with_clock() {
        let env = create_test_env();
        let mut state = TodoState::new();
        let effects = TodoReducer::new().reduce(
            &mut state,
            TodoAction::CreateItem {
                identity: Some(alice()),
                text: "buy milk".into(),
            },
            &env,
        );

        let produced = tokio_test::block_on(drain_effects(effects));
        let [TodoAction::ItemCreated { item }] = produced.as_slice() else {
            panic!("expected ItemCreated, got {produced:?}");
        };
        assert_eq!(item.owner_id, UserId::new("u1"));
        assert_eq!(item.text, "buy milk");
        assert!(!item.completed);
        assert_eq!(item.created_at.as_str(), "2025-01-01 00:00:00");
    }

    #[test]
    fn test_item_created_prepends_and_clears_draft() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                items: vec![item("a", "u1", false)],
                draft: "buy milk".into(),
                last_error: Some(RemoteAccessError::Unavailable("offline".into())),
                ..TodoState::new()
            })
            .when_action(TodoAction::ItemCreated {
                item: item("b", "u1", false),
            })
            .then_state(|state| {
                assert_eq!(state.count(), 2);
                assert_eq!(state.items[0].id, ItemId::new("b"));
                assert!(state.draft.is_empty());
                assert!(state.last_error.is_none());
            })
            .run();
    }

    #[test]
    fn test_create_failure_keeps_cache_and_draft() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                draft: "buy milk".into(),
                ..TodoState::new()
            })
            .when_action(TodoAction::CreateFailed {
                error: RemoteAccessError::Unavailable("offline".into()),
            })
            .then_state(|state| {
                assert_eq!(state.count(), 0);
                assert_eq!(state.draft, "buy milk");
                assert_eq!(
                    state.last_error,
                    Some(RemoteAccessError::Unavailable("offline".into()))
                );
            })
            .run();
    }

    #[test]
    fn test_commands_without_identity_are_noops() {
        let id = ItemId::new("a");
        for action in [
            TodoAction::LoadItems { identity: None },
            TodoAction::CreateItem {
                identity: None,
                text: "buy milk".into(),
            },
            TodoAction::ToggleItem {
                identity: None,
                id: id.clone(),
            },
            TodoAction::DeleteItem {
                identity: None,
                id: id.clone(),
            },
            TodoAction::ToggleMode { identity: None },
        ] {
            let initial = state_with(vec![item("a", "u1", false)]);
            ReducerTest::new(TodoReducer::new())
                .with_env(create_test_env())
                .given_state(initial.clone())
                .when_action(action)
                .then_state(move |state| assert_eq!(state, &initial))
                .then_effects(assertions::assert_no_effects)
                .run();
        }
    }

    #[test]
    fn test_toggle_of_foreign_item_raises_notice() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(vec![item("a", "u2", false)]))
            .when_action(TodoAction::OwnershipChecked {
                id: ItemId::new("a"),
                mutation: Mutation::Toggle,
                owned: false,
            })
            .then_state(|state| {
                assert_eq!(state.notice, Some(Notice::CannotToggleOthersItem));
                assert!(!state.items[0].completed);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_delete_of_foreign_item_raises_notice() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(vec![item("a", "u2", false)]))
            .when_action(TodoAction::OwnershipChecked {
                id: ItemId::new("a"),
                mutation: Mutation::Delete,
                owned: false,
            })
            .then_state(|state| {
                assert_eq!(state.notice, Some(Notice::CannotDeleteOthersItem));
                assert_eq!(state.count(), 1);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_owned_toggle_flips_then_rolls_back() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(vec![
                item("a", "u1", false),
                item("b", "u1", false),
            ]))
            .when_action(TodoAction::OwnershipChecked {
                id: ItemId::new("b"),
                mutation: Mutation::Toggle,
                owned: true,
            })
            .when_action(TodoAction::ToggleFailed {
                id: ItemId::new("b"),
                previous: false,
                error: RemoteAccessError::NotFound("b".into()),
            })
            .then_state(|state| {
                assert!(state.items.iter().all(|item| !item.completed));
                assert_eq!(
                    state.last_error,
                    Some(RemoteAccessError::NotFound("b".into()))
                );
            })
            .run();
    }

    #[test]
    fn test_owned_toggle_of_uncached_item_is_skipped() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::OwnershipChecked {
                id: ItemId::new("gone"),
                mutation: Mutation::Toggle,
                owned: true,
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_owned_delete_removes_then_restores_in_place() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(vec![
                item("a", "u1", false),
                item("b", "u1", true),
                item("c", "u1", false),
            ]))
            .when_action(TodoAction::OwnershipChecked {
                id: ItemId::new("b"),
                mutation: Mutation::Delete,
                owned: true,
            })
            .then_state(|state| {
                assert_eq!(state.count(), 2);
                assert!(state.get(&ItemId::new("b")).is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(vec![item("a", "u1", false), item("c", "u1", false)]))
            .when_action(TodoAction::DeleteFailed {
                id: ItemId::new("b"),
                restore: Some((1, item("b", "u1", true))),
                error: RemoteAccessError::Unavailable("offline".into()),
            })
            .then_state(|state| {
                let ids: Vec<_> = state.items.iter().map(|i| i.id.as_str()).collect();
                assert_eq!(ids, ["a", "b", "c"]);
                assert!(state.last_error.is_some());
            })
            .run();
    }

    #[test]
    fn test_delete_restore_clamps_to_cache_length() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::DeleteFailed {
                id: ItemId::new("b"),
                restore: Some((5, item("b", "u1", false))),
                error: RemoteAccessError::Unavailable("offline".into()),
            })
            .then_state(|state| assert_eq!(state.count(), 1))
            .run();
    }

    #[test]
    fn test_toggle_mode_for_admin() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::ToggleMode {
                identity: Some(admin()),
            })
            .then_state(|state| {
                assert_eq!(state.mode, ViewMode::Admin);
                assert!(state.notice.is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_toggle_mode_refused_for_non_admin() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::ToggleMode {
                identity: Some(alice()),
            })
            .then_state(|state| {
                assert_eq!(state.mode, ViewMode::Normal);
                assert_eq!(state.notice, Some(Notice::NotAnAdmin));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_leaving_admin_mode_needs_no_allow_list() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                mode: ViewMode::Admin,
                ..TodoState::new()
            })
            .when_action(TodoAction::ToggleMode {
                identity: Some(alice()),
            })
            .then_state(|state| assert_eq!(state.mode, ViewMode::Normal))
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_stale_listing_is_discarded() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state_with(vec![item("a", "u1", false)]))
            .when_action(TodoAction::ItemsLoaded {
                mode: ViewMode::Admin,
                items: vec![item("x", "u2", false)],
            })
            .then_state(|state| {
                assert_eq!(state.count(), 1);
                assert_eq!(state.items[0].id, ItemId::new("a"));
            })
            .run();
    }

    #[test]
    fn test_notice_dismissal() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                notice: Some(Notice::NotAnAdmin),
                ..TodoState::new()
            })
            .when_action(TodoAction::DismissNotice)
            .then_state(|state| assert!(state.notice.is_none()))
            .run();
    }

    #[tokio::test]
    async fn test_load_scopes_by_mode() {
        let collection = Arc::new(InMemoryCollection::new("todos"));
        seed(&collection, "u2", "theirs", "2025-01-01 00:00:01").await;
        seed(&collection, "u1", "mine", "2025-01-01 00:00:02").await;
        seed(&collection, "u1", "older", "2025-01-01 00:00:00").await;
        let env = create_test_env_with(collection);

        let mut state = TodoState::new();
        let effects = TodoReducer::new().reduce(
            &mut state,
            TodoAction::LoadItems {
                identity: Some(alice()),
            },
            &env,
        );
        let produced = drain_effects(effects).await;
        let [TodoAction::ItemsLoaded { mode, items }] = produced.as_slice() else {
            panic!("expected a listing, got {produced:?}");
        };
        assert_eq!(*mode, ViewMode::Normal);
        let texts: Vec<_> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["older", "mine"]);

        state.mode = ViewMode::Admin;
        let effects = TodoReducer::new().reduce(
            &mut state,
            TodoAction::LoadItems {
                identity: Some(alice()),
            },
            &env,
        );
        let produced = drain_effects(effects).await;
        let [TodoAction::ItemsLoaded { items, .. }] = produced.as_slice() else {
            panic!("expected a listing, got {produced:?}");
        };
        let texts: Vec<_> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["older", "theirs", "mine"]);
    }

    #[tokio::test]
    async fn test_ownership_check_reads_remote() {
        let collection = Arc::new(InMemoryCollection::new("todos"));
        let mine = seed(&collection, "u1", "mine", "2025-01-01 00:00:00").await;
        let theirs = seed(&collection, "u2", "theirs", "2025-01-01 00:00:01").await;
        let env = create_test_env_with(Arc::clone(&collection));

        // The cache claims the foreign item is ours; the remote read wins
        let mut state = state_with(vec![item(&theirs, "u1", false)]);
        let effects = TodoReducer::new().reduce(
            &mut state,
            TodoAction::ToggleItem {
                identity: Some(alice()),
                id: ItemId::new(theirs.clone()),
            },
            &env,
        );
        assert_eq!(
            drain_effects(effects).await,
            vec![TodoAction::OwnershipChecked {
                id: ItemId::new(theirs),
                mutation: Mutation::Toggle,
                owned: false,
            }]
        );

        collection.fail_next(
            Operation::Query,
            RemoteAccessError::PermissionDenied("signed out".into()),
        );
        let effects = TodoReducer::new().reduce(
            &mut state,
            TodoAction::DeleteItem {
                identity: Some(alice()),
                id: ItemId::new(mine.clone()),
            },
            &env,
        );
        assert_eq!(
            drain_effects(effects).await,
            vec![TodoAction::OwnershipCheckFailed {
                id: ItemId::new(mine),
                mutation: Mutation::Delete,
                error: RemoteAccessError::PermissionDenied("signed out".into()),
            }]
        );
    }

    #[tokio::test]
    async fn test_malformed_document_fails_load() {
        let collection = Arc::new(InMemoryCollection::new("todos"));
        let mut fields = Fields::new();
        fields.insert(OWNER_FIELD.into(), "u1".into());
        collection.insert(fields).await.unwrap();
        let env = create_test_env_with(collection);

        let mut state = TodoState::new();
        let effects = TodoReducer::new().reduce(
            &mut state,
            TodoAction::LoadItems {
                identity: Some(alice()),
            },
            &env,
        );
        let produced = drain_effects(effects).await;
        assert!(matches!(
            produced.as_slice(),
            [TodoAction::LoadFailed {
                error: RemoteAccessError::Malformed(_)
            }]
        ));
    }

    proptest! {
        #[test]
        fn prop_blank_text_never_creates(text in "[ \t\n]{0,8}") {
            let env = create_test_env();
            let mut state = TodoState::new();
            let effects = TodoReducer::new().reduce(
                &mut state,
                TodoAction::CreateItem { identity: Some(alice()), text },
                &env,
            );
            prop_assert!(effects.iter().all(Effect::is_noop));
            prop_assert_eq!(state, TodoState::new());
        }

        #[test]
        fn prop_owned_toggle_flips_exactly_one(
            flags in prop::collection::vec(any::<bool>(), 1..8),
            pick in any::<prop::sample::Index>(),
        ) {
            let items: Vec<_> = flags
                .iter()
                .enumerate()
                .map(|(n, done)| item(&n.to_string(), "u1", *done))
                .collect();
            let target = pick.index(items.len());
            let before = state_with(items);
            let mut state = before.clone();

            let effects = TodoReducer::new().reduce(
                &mut state,
                TodoAction::OwnershipChecked {
                    id: ItemId::new(target.to_string()),
                    mutation: Mutation::Toggle,
                    owned: true,
                },
                &create_test_env(),
            );

            prop_assert_eq!(effects.len(), 1);
            for (n, (now, then)) in state.items.iter().zip(&before.items).enumerate() {
                if n == target {
                    prop_assert_eq!(now.completed, !then.completed);
                } else {
                    prop_assert_eq!(now, then);
                }
            }
        }

        #[test]
        fn prop_owned_delete_removes_exactly_one(
            len in 1usize..8,
            pick in any::<prop::sample::Index>(),
        ) {
            let items: Vec<_> = (0..len).map(|n| item(&n.to_string(), "u1", false)).collect();
            let target = pick.index(len);
            let mut state = state_with(items);

            TodoReducer::new().reduce(
                &mut state,
                TodoAction::OwnershipChecked {
                    id: ItemId::new(target.to_string()),
                    mutation: Mutation::Delete,
                    owned: true,
                },
                &create_test_env(),
            );

            prop_assert_eq!(state.count(), len - 1);
            prop_assert!(state.get(&ItemId::new(target.to_string())).is_none());
        }
    }
}
