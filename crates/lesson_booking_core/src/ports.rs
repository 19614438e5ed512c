//! crates/lesson_booking_core/src/ports.rs
//!
//! Defines the storage contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the document database that actually holds the data.

use crate::domain::{Lesson, LessonPatch, NewOrder, ObjectIdHex, Order, UpdateOutcome};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the database driver.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The store could not be reached (connect, auth or server selection failed).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait LessonStore: Send + Sync {
    /// Every lesson, in the store's natural order.
    async fn list_lessons(&self) -> PortResult<Vec<Lesson>>;

    /// Ranked full-text search over `subject` and `location`.
    async fn text_search_lessons(&self, query: &str) -> PortResult<Vec<Lesson>>;

    /// Case-insensitive literal substring match on `subject` or `location`.
    async fn substring_search_lessons(&self, needle: &str) -> PortResult<Vec<Lesson>>;

    /// Merges `patch` into the lesson with the given id.
    async fn update_lesson(&self, id: &ObjectIdHex, patch: &LessonPatch)
        -> PortResult<UpdateOutcome>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn list_orders(&self) -> PortResult<Vec<Order>>;

    /// Persists a validated order and returns its generated identifier.
    async fn insert_order(&self, order: &NewOrder) -> PortResult<ObjectIdHex>;
}
