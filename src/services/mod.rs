//! Service layer for photoscan.
//!
//! Composes the gallery, the recognition pool, the document scanner and the
//! secondary OCR engine behind one facade usable by the CLI or an embedding
//! application.

mod photo;

pub use photo::{open_gallery, platform_for, PhotoService};
