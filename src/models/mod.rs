//! Data models for photoscan.

mod photo;

pub use photo::{CapturedPhoto, PhotoRecord, PHOTO_FILE_EXTENSION};
