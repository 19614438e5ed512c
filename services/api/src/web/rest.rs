//! services/api/src/web/rest.rs
//!
//! Shared REST response types and the master definition for the OpenAPI
//! specification.

use crate::error::ErrorResponse;
use crate::web::{images, lessons, meta, orders};
use serde::Serialize;
use std::io;
use std::path::Path;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        meta::root_handler,
        meta::health_handler,
        lessons::list_lessons_handler,
        lessons::search_lessons_handler,
        lessons::update_lesson_handler,
        orders::list_orders_handler,
        orders::create_order_handler,
        images::image_handler,
    ),
    components(
        schemas(
            MessageResponse,
            ErrorResponse,
            lessons::LessonBody,
            lessons::LessonUpdateRequest,
            orders::CreateOrderRequest,
            orders::CreateOrderResponse,
            orders::OrderBody,
            orders::OrderListResponse,
            meta::RootResponse,
            meta::HealthResponse,
        )
    ),
    tags(
        (name = "lessons", description = "Browse, search and update lessons."),
        (name = "orders", description = "Place and list orders."),
        (name = "images", description = "Static lesson images."),
        (name = "meta", description = "API metadata and health.")
    )
)]
pub struct ApiDoc;

/// Writes the pretty-printed OpenAPI document to `path`, creating missing
/// parent directories. Returns the number of documented paths.
pub fn write_openapi(path: &Path) -> io::Result<usize> {
    let doc = ApiDoc::openapi();
    let json = doc.to_pretty_json().map_err(io::Error::other)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    Ok(doc.paths.paths.len())
}

//=========================================================================================
// Shared Response Structs
//=========================================================================================

/// A plain confirmation message.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_every_route() {
        let json = ApiDoc::openapi().to_pretty_json().unwrap();
        for path in ["\"/lessons\"", "\"/lessons/search\"", "\"/lessons/{id}\"", "\"/order\"", "\"/health\"", "\"/images/{path}\""] {
            assert!(json.contains(path), "missing {path}");
        }
    }

    #[test]
    fn openapi_document_is_written_into_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs").join("openapi.json");

        let routes = write_openapi(&path).unwrap();

        assert_eq!(routes, 7);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written["paths"]["/order"].is_object());
    }
}
