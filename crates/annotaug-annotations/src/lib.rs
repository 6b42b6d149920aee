//! Reader and writer for box + keypoint annotation files in the imglab XML
//! layout (`dataset/images/image/box/part`).
//!
//! Loading is fail-fast: the first image entry that does not carry exactly one
//! box with four numeric parts rejects the whole file. Writing accumulates
//! records and emits them in a single indented document.

mod record;
mod store;
mod xml;

pub use record::Record;
pub use store::{AnnotationError, AnnotationStore};
