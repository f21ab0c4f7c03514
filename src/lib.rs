//! Image upload and gallery service.
//!
//! Accepts image uploads over HTTP, stores them in a blob container under a
//! timestamped name, and lists their public URLs back, newest first.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
