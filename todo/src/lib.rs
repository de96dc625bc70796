//! Per-user to-do list synchronised with a remote document collection.
//!
//! Every signed-in user sees and edits their own items. Users on the admin
//! allow-list can widen the view to every user's items, read-only for items
//! they do not own.
//!
//! The list is a [`TodoReducer`] running in a `todoboard-runtime` store.
//! Remote calls are effects; [`TodoStore`] wraps the store with async
//! methods that wait for each call's effects to settle and return the result.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use todoboard::{Identity, InMemoryCollection, TodoConfig, TodoEnvironment, TodoStore};
//! use todoboard_core::environment::SystemClock;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TodoConfig::from_env()?;
//! let collection = Arc::new(InMemoryCollection::new(config.collection.clone()));
//! let env = TodoEnvironment::new(Arc::new(SystemClock), collection, Arc::new(config));
//! let store = TodoStore::new(env);
//!
//! let me = Identity::new("u1", "Alice");
//! store.create_item(Some(&me), "buy milk").await?;
//!
//! for item in store.list_items(Some(&me)).await? {
//!     println!("[{}] {}", if item.completed { "x" } else { " " }, item.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod config;
pub mod record;
pub mod reducer;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use collection::{DocumentCollection, InMemoryCollection, RemoteAccessError};
pub use config::{ConfigError, TodoConfig};
pub use reducer::{TodoEnvironment, TodoReducer};
pub use store::{MutationOutcome, TodoError, TodoStore};
pub use types::{Identity, ItemId, Notice, TodoAction, TodoItem, TodoState, ViewMode};
