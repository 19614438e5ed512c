//! crates/lesson_booking_core/src/services.rs
//!
//! The lesson query and order intake services. They own every request
//! validation rule and talk to storage only through the ports.

use crate::domain::{Lesson, LessonPatch, NewOrder, ObjectIdHex, OrderListing};
use crate::ports::{LessonStore, OrderStore, PortError};
use std::sync::Arc;

//=========================================================================================
// Service Error and Result Types
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request itself is malformed; nothing was touched.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Database connection failed: {0}")]
    Connection(String),
    #[error("Store operation failed: {0}")]
    Store(String),
}

impl From<PortError> for ServiceError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Unavailable(msg) => ServiceError::Connection(msg),
            PortError::Unexpected(msg) => ServiceError::Store(msg),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

//=========================================================================================
// Lesson Query Service
//=========================================================================================

#[derive(Clone)]
pub struct LessonService {
    store: Arc<dyn LessonStore>,
}

impl LessonService {
    pub fn new(store: Arc<dyn LessonStore>) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<Lesson>> {
        Ok(self.store.list_lessons().await?)
    }

    /// Ranked text search first; when that finds nothing, a substring match on
    /// `subject`/`location` so partial words still hit.
    pub async fn search(&self, query: Option<&str>) -> ServiceResult<Vec<Lesson>> {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ServiceError::Validation("Search query is required.".to_string()))?;

        let ranked = self.store.text_search_lessons(query).await?;
        if !ranked.is_empty() {
            return Ok(ranked);
        }

        let matches = self.store.substring_search_lessons(query).await?;
        if matches.is_empty() {
            return Err(ServiceError::NotFound("No lessons found.".to_string()));
        }
        Ok(matches)
    }

    pub async fn update(&self, id: &str, patch: LessonPatch) -> ServiceResult<()> {
        let id = ObjectIdHex::parse(id)
            .map_err(|_| ServiceError::Validation("Invalid lesson ID.".to_string()))?;

        if patch.is_empty() {
            return Err(ServiceError::Validation(
                "No data provided for update.".to_string(),
            ));
        }
        if patch.touches_id() {
            return Err(ServiceError::Validation(
                "The lesson ID cannot be changed.".to_string(),
            ));
        }

        let outcome = self.store.update_lesson(&id, &patch).await?;
        if outcome.modified == 0 {
            return Err(ServiceError::NotFound(
                "Lesson not found or no fields changed.".to_string(),
            ));
        }
        Ok(())
    }
}

//=========================================================================================
// Order Intake Service
//=========================================================================================

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> ServiceResult<OrderListing> {
        let orders = self.store.list_orders().await?;
        Ok(OrderListing {
            count: orders.len(),
            orders,
        })
    }

    /// Validates and stores a new order. Referenced lessons are only checked
    /// for well-formedness, not for existence.
    pub async fn create(&self, order: NewOrder) -> ServiceResult<ObjectIdHex> {
        if order.lesson_ids.is_empty() {
            return Err(ServiceError::Validation(
                "At least one lesson ID is required.".to_string(),
            ));
        }
        if !order.lesson_ids.iter().all(|id| ObjectIdHex::is_valid(id)) {
            return Err(ServiceError::Validation(
                "One or more lesson IDs are invalid.".to_string(),
            ));
        }

        Ok(self.store.insert_order(&order).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use serde_json::{json, Map, Value};

    const MATH_ID: &str = "65a1f0c2e4b0a1b2c3d4e5f1";
    const ART_ID: &str = "65a1f0c2e4b0a1b2c3d4e5f2";

    fn seeded_store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::with_lessons([
            json!({ "_id": MATH_ID, "subject": "Math", "location": "London", "price": 100, "spaces": 5 }),
            json!({ "_id": ART_ID, "subject": "Art", "location": "Oxford", "price": 80, "spaces": 5 }),
        ]))
    }

    fn patch(value: Value) -> LessonPatch {
        match value {
            Value::Object(map) => LessonPatch::new(map),
            other => panic!("patch must be an object, got {other}"),
        }
    }

    #[tokio::test]
    async fn list_all_returns_every_lesson() {
        let service = LessonService::new(seeded_store());
        let lessons = service.list_all().await.unwrap();
        assert_eq!(lessons.len(), 2);
    }

    #[tokio::test]
    async fn search_requires_a_query() {
        let store = seeded_store();
        let service = LessonService::new(store.clone());

        for query in [None, Some(""), Some("   ")] {
            let err = service.search(query).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{query:?}");
        }
        assert_eq!(store.substring_searches(), 0);
    }

    #[tokio::test]
    async fn search_uses_the_text_index_for_whole_words() {
        let store = seeded_store();
        let service = LessonService::new(store.clone());

        let lessons = service.search(Some("Math")).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].id, MATH_ID);
        assert_eq!(store.substring_searches(), 0);
    }

    #[tokio::test]
    async fn search_falls_back_to_substring_for_partial_words() {
        let store = seeded_store();
        let service = LessonService::new(store.clone());

        let lessons = service.search(Some("mat")).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].subject(), Some("Math"));
        assert_eq!(store.substring_searches(), 1);

        let by_location = service.search(Some("xfor")).await.unwrap();
        assert_eq!(by_location[0].id, ART_ID);
    }

    #[tokio::test]
    async fn search_without_any_match_is_not_found() {
        let service = LessonService::new(seeded_store());
        let err = service
            .search(Some("nonexistent-token-xyz"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "No lessons found."));
    }

    #[tokio::test]
    async fn update_merges_only_the_supplied_fields() {
        let store = seeded_store();
        let service = LessonService::new(store.clone());

        service
            .update(MATH_ID, patch(json!({ "spaces": 4 })))
            .await
            .unwrap();

        let math = store.lesson(MATH_ID).unwrap();
        assert_eq!(math.fields["spaces"], json!(4));
        assert_eq!(math.fields["price"], json!(100));
        assert_eq!(math.subject(), Some("Math"));

        let art = store.lesson(ART_ID).unwrap();
        assert_eq!(art.fields["spaces"], json!(5));
    }

    #[tokio::test]
    async fn update_rejects_malformed_requests_without_mutating() {
        let store = seeded_store();
        let service = LessonService::new(store.clone());
        let before = store.lessons();

        let cases = [
            ("not-an-id", patch(json!({ "spaces": 1 }))),
            (MATH_ID, LessonPatch::new(Map::new())),
            (MATH_ID, patch(json!({ "_id": ART_ID }))),
        ];
        for (id, patch) in cases {
            let err = service.update(id, patch).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
        assert_eq!(store.lessons(), before);
    }

    #[tokio::test]
    async fn update_of_unknown_or_unchanged_lesson_is_not_found() {
        let service = LessonService::new(seeded_store());

        let unknown = service
            .update("65a1f0c2e4b0a1b2c3d4e5ff", patch(json!({ "spaces": 1 })))
            .await
            .unwrap_err();
        assert!(matches!(unknown, ServiceError::NotFound(_)));

        let unchanged = service
            .update(MATH_ID, patch(json!({ "price": 100 })))
            .await
            .unwrap_err();
        assert!(matches!(unchanged, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_order_validates_lesson_ids() {
        let store = seeded_store();
        let service = OrderService::new(store.clone());

        let empty = NewOrder {
            order_info: json!({ "name": "Ada" }),
            lesson_ids: vec![],
        };
        assert!(matches!(
            service.create(empty).await,
            Err(ServiceError::Validation(_))
        ));

        let malformed = NewOrder {
            order_info: json!({ "name": "Ada" }),
            lesson_ids: vec![MATH_ID.to_string(), "not-an-id".to_string()],
        };
        assert!(matches!(
            service.create(malformed).await,
            Err(ServiceError::Validation(_))
        ));

        assert_eq!(service.list().await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn created_order_shows_up_in_listing() {
        let service = OrderService::new(seeded_store());

        let id = service
            .create(NewOrder {
                order_info: json!({ "name": "Ada", "phone": "0123" }),
                lesson_ids: vec![MATH_ID.to_string(), ART_ID.to_string()],
            })
            .await
            .unwrap();

        let listing = service.list().await.unwrap();
        assert_eq!(listing.count, 1);
        assert_eq!(listing.orders[0].id, id.as_str());
        assert_eq!(listing.orders[0].lesson_ids, vec![MATH_ID, ART_ID]);
    }

    #[tokio::test]
    async fn create_order_does_not_check_that_lessons_exist() {
        let service = OrderService::new(seeded_store());
        let result = service
            .create(NewOrder {
                order_info: Value::Null,
                lesson_ids: vec!["ffffffffffffffffffffffff".to_string()],
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unavailable_store_maps_to_connection_error() {
        let store = seeded_store();
        store.set_unavailable(true);

        let lessons = LessonService::new(store.clone());
        assert!(matches!(
            lessons.list_all().await,
            Err(ServiceError::Connection(_))
        ));
        let orders = OrderService::new(store);
        assert!(matches!(orders.list().await, Err(ServiceError::Connection(_))));
    }
}
