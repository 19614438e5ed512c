//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `LessonStore` and `OrderStore` ports from the `core` crate. It handles all
//! interactions with MongoDB through the shared [`DatabaseSession`].

use crate::adapters::session::{DatabaseSession, LESSONS_COLLECTION, ORDERS_COLLECTION};
use async_trait::async_trait;
use futures::TryStreamExt;
use lesson_booking_core::domain::{
    Lesson, LessonPatch, NewOrder, ObjectIdHex, Order, UpdateOutcome,
};
use lesson_booking_core::ports::{LessonStore, OrderStore, PortError, PortResult};
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson, Document},
    error::ErrorKind,
    Collection,
};
use serde_json::{Map, Value};
use std::sync::Arc;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements both store ports on top of MongoDB.
#[derive(Clone)]
pub struct DbAdapter {
    session: Arc<DatabaseSession>,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(session: Arc<DatabaseSession>) -> Self {
        Self { session }
    }

    async fn collection(&self, name: &str) -> PortResult<Collection<Document>> {
        let handle = self
            .session
            .connect()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        Ok(handle.db().collection(name))
    }

    async fn find_lessons(&self, filter: Document, ranked: bool) -> PortResult<Vec<Lesson>> {
        let lessons = self.collection(LESSONS_COLLECTION).await?;
        let mut find = lessons.find(filter);
        if ranked {
            find = find.sort(text_score_sort());
        }
        let docs: Vec<Document> = find
            .await
            .map_err(to_port_error)?
            .try_collect()
            .await
            .map_err(to_port_error)?;
        docs.into_iter().map(lesson_from_document).collect()
    }
}

//=========================================================================================
// Error and Document Conversion
//=========================================================================================

/// Driver failures that mean the server could not be reached at all.
fn to_port_error(err: mongodb::error::Error) -> PortError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Authentication { .. }
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::Io(_) => PortError::Unavailable(err.to_string()),
        _ => PortError::Unexpected(err.to_string()),
    }
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Converts stored BSON to the JSON the API returns. Ids become hex strings and
/// dates RFC 3339 strings at any depth.
fn to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(date) => match date.try_to_rfc3339_string() {
            Ok(text) => Value::String(text),
            Err(_) => Bson::DateTime(date).into_relaxed_extjson(),
        },
        Bson::Document(doc) => Value::Object(
            doc.into_iter()
                .map(|(key, value)| (key, to_json(value)))
                .collect::<Map<String, Value>>(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

fn lesson_from_document(mut doc: Document) -> PortResult<Lesson> {
    let id = doc
        .remove("_id")
        .ok_or_else(|| PortError::Unexpected("lesson document without _id".to_string()))?;
    let fields = match to_json(Bson::Document(doc)) {
        Value::Object(fields) => fields,
        other => {
            return Err(PortError::Unexpected(format!(
                "lesson document is not an object: {other}"
            )))
        }
    };
    Ok(Lesson {
        id: id_to_string(&id),
        fields,
    })
}

fn order_from_document(mut doc: Document) -> PortResult<Order> {
    let id = doc
        .remove("_id")
        .ok_or_else(|| PortError::Unexpected("order document without _id".to_string()))?;
    let order_info = doc.remove("orderInfo").map(to_json).unwrap_or(Value::Null);
    let lesson_ids = match doc.remove("lessonId") {
        Some(Bson::Array(ids)) => ids.iter().map(id_to_string).collect(),
        Some(single) => vec![id_to_string(&single)],
        None => Vec::new(),
    };
    Ok(Order {
        id: id_to_string(&id),
        order_info,
        lesson_ids,
    })
}

//=========================================================================================
// Query Construction
//=========================================================================================

fn text_filter(query: &str) -> Document {
    doc! { "$text": { "$search": query } }
}

fn text_score_sort() -> Document {
    doc! { "score": { "$meta": "textScore" } }
}

/// Case-insensitive literal substring match on `subject` or `location`.
fn substring_filter(needle: &str) -> Document {
    let pattern = regex::escape(needle);
    doc! {
        "$or": [
            { "subject": { "$regex": pattern.as_str(), "$options": "i" } },
            { "location": { "$regex": pattern.as_str(), "$options": "i" } }
        ]
    }
}

fn set_update(patch: &LessonPatch) -> PortResult<Document> {
    let fields =
        bson::to_document(patch.fields()).map_err(|e| PortError::Unexpected(e.to_string()))?;
    Ok(doc! { "$set": fields })
}

fn object_id(id: &ObjectIdHex) -> PortResult<ObjectId> {
    ObjectId::parse_str(id.as_str()).map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl LessonStore for DbAdapter {
    async fn list_lessons(&self) -> PortResult<Vec<Lesson>> {
        self.find_lessons(doc! {}, false).await
    }

    async fn text_search_lessons(&self, query: &str) -> PortResult<Vec<Lesson>> {
        self.find_lessons(text_filter(query), true).await
    }

    async fn substring_search_lessons(&self, needle: &str) -> PortResult<Vec<Lesson>> {
        self.find_lessons(substring_filter(needle), false).await
    }

    async fn update_lesson(
        &self,
        id: &ObjectIdHex,
        patch: &LessonPatch,
    ) -> PortResult<UpdateOutcome> {
        let update = set_update(patch)?;
        let result = self
            .collection(LESSONS_COLLECTION)
            .await?
            .update_one(doc! { "_id": object_id(id)? }, update)
            .await
            .map_err(to_port_error)?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }
}

#[async_trait]
impl OrderStore for DbAdapter {
    async fn list_orders(&self) -> PortResult<Vec<Order>> {
        let docs: Vec<Document> = self
            .collection(ORDERS_COLLECTION)
            .await?
            .find(doc! {})
            .await
            .map_err(to_port_error)?
            .try_collect()
            .await
            .map_err(to_port_error)?;
        docs.into_iter().map(order_from_document).collect()
    }

    async fn insert_order(&self, order: &NewOrder) -> PortResult<ObjectIdHex> {
        let order_info =
            bson::to_bson(&order.order_info).map_err(|e| PortError::Unexpected(e.to_string()))?;
        let result = self
            .collection(ORDERS_COLLECTION)
            .await?
            .insert_one(doc! { "orderInfo": order_info, "lessonId": order.lesson_ids.clone() })
            .await
            .map_err(to_port_error)?;
        ObjectIdHex::parse(&id_to_string(&result.inserted_id))
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}
