//! crates/lesson_booking_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These structs are independent of any database driver or HTTP framework; the
//! only format they know about is the JSON shape of their free-form fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Identifiers
//=========================================================================================

/// A store-generated document identifier in its 24-character hexadecimal form.
///
/// Construction always goes through [`ObjectIdHex::parse`], so holding one means
/// the string is well-formed. It says nothing about whether a document with
/// that identifier exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectIdHex(String);

/// Returned when a string is not a well-formed document identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid identifier")]
pub struct InvalidObjectId(pub String);

impl ObjectIdHex {
    pub const LEN: usize = 24;

    /// Returns true when `candidate` is exactly 24 ASCII hex digits.
    pub fn is_valid(candidate: &str) -> bool {
        candidate.len() == Self::LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn parse(candidate: &str) -> Result<Self, InvalidObjectId> {
        if Self::is_valid(candidate) {
            Ok(Self(candidate.to_ascii_lowercase()))
        } else {
            Err(InvalidObjectId(candidate.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectIdHex {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectIdHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//=========================================================================================
// Lessons
//=========================================================================================

/// A bookable tutoring offering.
///
/// Only `subject` and `location` carry meaning for this service (they back the
/// search index); every other field is carried through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Lesson {
    pub fn subject(&self) -> Option<&str> {
        self.fields.get("subject").and_then(Value::as_str)
    }

    pub fn location(&self) -> Option<&str> {
        self.fields.get("location").and_then(Value::as_str)
    }
}

/// A partial set of lesson fields to merge into an existing lesson.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonPatch {
    fields: Map<String, Value>,
}

impl LessonPatch {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when the patch tries to overwrite the document identifier.
    pub fn touches_id(&self) -> bool {
        self.fields.contains_key("_id")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// What the store reports back after applying a [`LessonPatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

//=========================================================================================
// Orders
//=========================================================================================

/// A customer purchase referencing one or more lessons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "orderInfo")]
    pub order_info: Value,
    #[serde(rename = "lessonId")]
    pub lesson_ids: Vec<String>,
}

/// An order as submitted by a client, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_info: Value,
    pub lesson_ids: Vec<String>,
}

/// All stored orders together with their count.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderListing {
    pub count: usize,
    pub orders: Vec<Order>,
}
