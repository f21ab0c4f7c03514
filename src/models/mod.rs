//! Data shapes shared between the handlers and the gallery service.
//!
//! There is no database: the blob store's own listing is the only index, so
//! these types only describe what flows through a request.

pub mod image;
