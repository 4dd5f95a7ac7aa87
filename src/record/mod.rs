//! Per-image annotation records and their store.

mod bbox;
mod model;
mod store;
pub mod xml;

pub use bbox::BoundingBox;
pub use model::{ImageRecord, RecordObject, FLAGGED_TRUE};
pub use store::{AnnotationCounts, RecordStore};
