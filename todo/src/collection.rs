//! Remote document collection contract.
//!
//! The to-do list lives in a hosted document database. This module defines
//! the four operations the store consumes from it (query, insert, update,
//! delete) as a dyn-compatible trait, plus an in-process implementation used
//! by the demo binary and the tests.
//!
//! Documents are JSON objects keyed by a collection-assigned id. Queries
//! support one equality filter and one order-by clause, which is all a
//! per-owner, oldest-first listing needs.

use futures::FutureExt;
use futures::future::BoxFuture;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use thiserror::Error;

/// Field map of a stored document
pub type Fields = Map<String, Value>;

/// Result alias for remote collection calls
pub type RemoteResult<T> = Result<T, RemoteAccessError>;

/// Length of generated document ids
const GENERATED_ID_LEN: usize = 20;

/// Failures reported by the remote collection.
///
/// These are never retried locally; they are surfaced to the caller and
/// recorded in view state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteAccessError {
    /// The backend could not be reached or answered with a transient failure.
    #[error("Remote collection unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the call for the current credentials.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The addressed document does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// A stored document could not be decoded.
    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// A stored document: its id plus its fields
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Collection-assigned id
    pub id: String,
    /// Document body
    pub fields: Fields,
}

/// Sort direction for [`OrderBy`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// Equality filter on a single field
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    /// Field name
    pub field: String,
    /// Value the field must equal
    pub value: Value,
}

/// Ordering clause on a single field
#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    /// Field name
    pub field: String,
    /// Direction
    pub direction: Direction,
}

/// Query over a collection
///
/// ```
/// use todoboard::collection::{Direction, Query};
///
/// let query = Query::all()
///     .where_eq("userId", "u1")
///     .order_by("datetime", Direction::Ascending);
/// assert!(query.filter.is_some());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// Optional equality filter
    pub filter: Option<FieldFilter>,
    /// Optional ordering
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// Every document, in collection order
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep only documents whose `field` equals `value`
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Sort results by `field`
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    fn matches(&self, document: &Document) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| document.fields.get(&filter.field) == Some(&filter.value))
    }
}

/// Remote document collection.
///
/// Each document is independent; no operation spans more than one document.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures instead of using `async fn` so the collection
/// can be shared as `Arc<dyn DocumentCollection>` and captured by effects.
pub trait DocumentCollection: Send + Sync {
    /// Name of the collection
    fn name(&self) -> &str;

    /// Run a query.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteAccessError`] if the backend call fails.
    fn query(&self, query: Query) -> BoxFuture<'_, RemoteResult<Vec<Document>>>;

    /// Insert a new document, returning its generated id.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteAccessError`] if the backend call fails.
    fn insert(&self, fields: Fields) -> BoxFuture<'_, RemoteResult<String>>;

    /// Merge `fields` into an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteAccessError::NotFound`] for an unknown id, or another
    /// [`RemoteAccessError`] if the backend call fails.
    fn update<'a>(&'a self, id: &'a str, fields: Fields) -> BoxFuture<'a, RemoteResult<()>>;

    /// Delete a document.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteAccessError::NotFound`] for an unknown id, or another
    /// [`RemoteAccessError`] if the backend call fails.
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, RemoteResult<()>>;
}

/// Collection operation, used to target injected failures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`DocumentCollection::query`]
    Query,
    /// [`DocumentCollection::insert`]
    Insert,
    /// [`DocumentCollection::update`]
    Update,
    /// [`DocumentCollection::delete`]
    Delete,
}

/// In-process document collection.
///
/// Keeps documents in insertion order and generates 20-character
/// alphanumeric ids. Failures can be injected one call at a time with
/// [`InMemoryCollection::fail_next`].
#[derive(Debug)]
pub struct InMemoryCollection {
    name: String,
    documents: RwLock<Vec<Document>>,
    failures: Mutex<HashMap<Operation, RemoteAccessError>>,
}

impl InMemoryCollection {
    /// Create an empty collection
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: Operation, error: RemoteAccessError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation, error);
    }

    /// Number of stored documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the collection holds no documents
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a single document
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Document> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
    }

    fn take_failure(&self, operation: Operation) -> RemoteResult<()> {
        match self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&operation)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn run_query(&self, query: &Query) -> RemoteResult<Vec<Document>> {
        self.take_failure(Operation::Query)?;

        let mut found: Vec<Document> = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|doc| query.matches(doc))
            .cloned()
            .collect();

        if let Some(order) = &query.order_by {
            found.sort_by(|a, b| {
                let ordering = compare_values(a.fields.get(&order.field), b.fields.get(&order.field));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        Ok(found)
    }

    fn run_insert(&self, fields: Fields) -> RemoteResult<String> {
        self.take_failure(Operation::Insert)?;

        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        let id = loop {
            let candidate = generate_id();
            if documents.iter().all(|doc| doc.id != candidate) {
                break candidate;
            }
        };
        documents.push(Document {
            id: id.clone(),
            fields,
        });
        tracing::trace!(collection = %self.name, id = %id, "Inserted document");
        Ok(id)
    }

    fn run_update(&self, id: &str, fields: Fields) -> RemoteResult<()> {
        self.take_failure(Operation::Update)?;

        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        let document = documents
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| RemoteAccessError::NotFound(id.to_string()))?;
        document.fields.extend(fields);
        Ok(())
    }

    fn run_delete(&self, id: &str) -> RemoteResult<()> {
        self.take_failure(Operation::Delete)?;

        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        let index = documents
            .iter()
            .position(|doc| doc.id == id)
            .ok_or_else(|| RemoteAccessError::NotFound(id.to_string()))?;
        documents.remove(index);
        Ok(())
    }
}

impl DocumentCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, query: Query) -> BoxFuture<'_, RemoteResult<Vec<Document>>> {
        futures::future::ready(self.run_query(&query)).boxed()
    }

    fn insert(&self, fields: Fields) -> BoxFuture<'_, RemoteResult<String>> {
        futures::future::ready(self.run_insert(fields)).boxed()
    }

    fn update<'a>(&'a self, id: &'a str, fields: Fields) -> BoxFuture<'a, RemoteResult<()>> {
        futures::future::ready(self.run_update(id, fields)).boxed()
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, RemoteResult<()>> {
        futures::future::ready(self.run_delete(id)).boxed()
    }
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LEN)
        .map(char::from)
        .collect()
}

/// Total order over optional JSON values; missing fields sort first.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            },
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}
