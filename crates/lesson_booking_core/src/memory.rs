//! crates/lesson_booking_core/src/memory.rs
//!
//! An in-memory implementation of both store ports, used to exercise the
//! services and the HTTP layer without a running database.
//!
//! Text search mimics a word index: a lesson matches when any whole word of the
//! query equals a whole word of its `subject` or `location` (case-insensitive).

use crate::domain::{Lesson, LessonPatch, NewOrder, ObjectIdHex, Order, UpdateOutcome};
use crate::ports::{LessonStore, OrderStore, PortError, PortResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
pub struct InMemoryStore {
    lessons: Mutex<Vec<Lesson>>,
    orders: Mutex<Vec<Order>>,
    next_id: AtomicU64,
    unavailable: AtomicBool,
    substring_searches: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with lesson documents. Each value must be a JSON object
    /// with a string `_id`.
    pub fn with_lessons(docs: impl IntoIterator<Item = Value>) -> Self {
        let lessons = docs
            .into_iter()
            .map(|doc| serde_json::from_value(doc).expect("seed lesson must have a string _id"))
            .collect();
        Self {
            lessons: Mutex::new(lessons),
            ..Self::default()
        }
    }

    /// Makes every subsequent call fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn lesson(&self, id: &str) -> Option<Lesson> {
        lock(&self.lessons).iter().find(|l| l.id == id).cloned()
    }

    pub fn lessons(&self) -> Vec<Lesson> {
        lock(&self.lessons).clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        lock(&self.orders).clone()
    }

    /// How many times the substring fallback has been queried.
    pub fn substring_searches(&self) -> usize {
        self.substring_searches.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> PortResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("in-memory store is offline".into()));
        }
        Ok(())
    }

    fn generate_id(&self) -> ObjectIdHex {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        ObjectIdHex::parse(&format!("{n:024x}")).expect("a 24-digit hex counter is a valid id")
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

fn indexed_text(lesson: &Lesson) -> impl Iterator<Item = &str> {
    [lesson.subject(), lesson.location()].into_iter().flatten()
}

#[async_trait]
impl LessonStore for InMemoryStore {
    async fn list_lessons(&self) -> PortResult<Vec<Lesson>> {
        self.check_available()?;
        Ok(self.lessons())
    }

    async fn text_search_lessons(&self, query: &str) -> PortResult<Vec<Lesson>> {
        self.check_available()?;
        let terms: Vec<String> = words(query).collect();

        let mut scored: Vec<(usize, Lesson)> = lock(&self.lessons)
            .iter()
            .filter_map(|lesson| {
                let score = indexed_text(lesson)
                    .flat_map(|text| words(text))
                    .filter(|w| terms.contains(w))
                    .count();
                (score > 0).then(|| (score, lesson.clone()))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().map(|(_, lesson)| lesson).collect())
    }

    async fn substring_search_lessons(&self, needle: &str) -> PortResult<Vec<Lesson>> {
        self.check_available()?;
        self.substring_searches.fetch_add(1, Ordering::SeqCst);
        let needle = needle.to_lowercase();

        Ok(lock(&self.lessons)
            .iter()
            .filter(|lesson| indexed_text(lesson).any(|t| t.to_lowercase().contains(&needle)))
            .cloned()
            .collect())
    }

    async fn update_lesson(
        &self,
        id: &ObjectIdHex,
        patch: &LessonPatch,
    ) -> PortResult<UpdateOutcome> {
        self.check_available()?;
        let mut lessons = lock(&self.lessons);
        let Some(lesson) = lessons.iter_mut().find(|l| l.id == id.as_str()) else {
            return Ok(UpdateOutcome::default());
        };

        let mut changed = false;
        for (key, value) in patch.fields() {
            if lesson.fields.get(key) != Some(value) {
                lesson.fields.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(changed),
        })
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn list_orders(&self) -> PortResult<Vec<Order>> {
        self.check_available()?;
        Ok(self.orders())
    }

    async fn insert_order(&self, order: &NewOrder) -> PortResult<ObjectIdHex> {
        self.check_available()?;
        let id = self.generate_id();
        lock(&self.orders).push(Order {
            id: id.to_string(),
            order_info: order.order_info.clone(),
            lesson_ids: order.lesson_ids.clone(),
        });
        Ok(id)
    }
}
