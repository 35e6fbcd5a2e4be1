//! Track catalog: track records, the recency list and their persistence.
//!
//! The engine only talks to the `Catalog` trait; `Library` is the
//! file-backed implementation and `import` fills it from disk.

mod import;
mod model;
mod store;

pub use import::import_dir;
pub use model::*;
pub use store::Library;
