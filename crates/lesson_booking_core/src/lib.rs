pub mod domain;
pub mod ports;
pub mod services;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use domain::{
    InvalidObjectId, Lesson, LessonPatch, NewOrder, ObjectIdHex, Order, OrderListing,
    UpdateOutcome,
};
pub use ports::{LessonStore, OrderStore, PortError, PortResult};
pub use services::{LessonService, OrderService, ServiceError, ServiceResult};
