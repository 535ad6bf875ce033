use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lms_core::model::{Course, CourseId, EntityId, Fact, SubjectId};
use lms_core::time::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── TRAITS ────────────────────────────────────────────────────────────────────
//

/// The persistent key-value fact store.
///
/// Rows are keyed by `(subject, entity, key)` with last-write-wins
/// semantics; adapters may keep history, but `get_facts` must return rows
/// most-recent-first so readers can resolve the latest value per key.
#[async_trait]
pub trait FactStore: Send + Sync {
    /// Fetch every fact row for a `(subject, entity)` pair,
    /// most-recent-first.
    ///
    /// An unknown pair is an empty sequence, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the store cannot be reached.
    async fn get_facts(
        &self,
        subject: SubjectId,
        entity: EntityId,
    ) -> Result<Vec<Fact>, StorageError>;

    /// Record a fact value for `(subject, entity, key)`.
    ///
    /// The write is a single atomic upsert at the store level; the stored
    /// row carries the store's current timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the write cannot be applied.
    async fn put_fact(
        &self,
        subject: SubjectId,
        entity: EntityId,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError>;
}

/// Title lookup for content entities (sections, lessons).
#[async_trait]
pub trait ContentLookup: Send + Sync {
    /// Resolve the display title of an entity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown entity; callers that
    /// only decorate output substitute an empty string.
    async fn title_of(&self, entity: EntityId) -> Result<String, StorageError>;
}

/// Repository contract for courses and their syllabi.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist or update a course, including its syllabus.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Load a course by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_course(&self, id: CourseId) -> Result<Course, StorageError>;
}

//
// ─── IN-MEMORY STORE ───────────────────────────────────────────────────────────
//

/// Simple in-memory store implementation for testing and prototyping.
///
/// Fact rows append per `(subject, entity)` pair and read back newest
/// first, matching the behavior expected of real adapters.
#[derive(Clone)]
pub struct InMemoryStore {
    clock: Clock,
    facts: Arc<Mutex<HashMap<(SubjectId, EntityId), Vec<Fact>>>>,
    titles: Arc<Mutex<HashMap<EntityId, String>>>,
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Clock::default())
    }

    /// Uses the given clock to timestamp fact writes (fixed clocks make
    /// tests deterministic).
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            facts: Arc::new(Mutex::new(HashMap::new())),
            titles: Arc::new(Mutex::new(HashMap::new())),
            courses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers a display title for an entity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the title map lock is
    /// poisoned.
    pub fn set_title(
        &self,
        entity: impl Into<EntityId>,
        title: impl Into<String>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .titles
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.insert(entity.into(), title.into());
        Ok(())
    }

    /// Appends a fact row with an explicit timestamp, bypassing the clock.
    ///
    /// Test hook for building histories with controlled ordering.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the fact map lock is poisoned.
    pub fn put_fact_at(
        &self,
        subject: SubjectId,
        entity: EntityId,
        key: &str,
        value: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .facts
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard
            .entry((subject, entity))
            .or_default()
            .push(Fact::new(key, value, at));
        Ok(())
    }
}

#[async_trait]
impl FactStore for InMemoryStore {
    async fn get_facts(
        &self,
        subject: SubjectId,
        entity: EntityId,
    ) -> Result<Vec<Fact>, StorageError> {
        let guard = self
            .facts
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let mut rows = guard.get(&(subject, entity)).cloned().unwrap_or_default();
        // Appended in write order; newest rows come back first. The sort is
        // stable, so same-timestamp rows keep insertion order and the later
        // write still wins after the reverse.
        rows.sort_by_key(|f| f.updated_at);
        rows.reverse();
        Ok(rows)
    }

    async fn put_fact(
        &self,
        subject: SubjectId,
        entity: EntityId,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        self.put_fact_at(subject, entity, key, value, self.clock.now())
    }
}

#[async_trait]
impl ContentLookup for InMemoryStore {
    async fn title_of(&self, entity: EntityId) -> Result<String, StorageError> {
        let guard = self
            .titles
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.get(&entity).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl CourseRepository for InMemoryStore {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Course, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the store traits behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub facts: Arc<dyn FactStore>,
    pub content: Arc<dyn ContentLookup>,
    pub courses: Arc<dyn CourseRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryStore::new())
    }

    #[must_use]
    pub fn from_in_memory(store: InMemoryStore) -> Self {
        let facts: Arc<dyn FactStore> = Arc::new(store.clone());
        let content: Arc<dyn ContentLookup> = Arc::new(store.clone());
        let courses: Arc<dyn CourseRepository> = Arc::new(store);
        Self {
            facts,
            content,
            courses,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
