//! services/api/src/lib.rs
//!
//! The lesson booking HTTP service: configuration, error rendering, the
//! MongoDB adapter and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
