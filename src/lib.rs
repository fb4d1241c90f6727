//! Build-time generator of typed query sets.
//!
//! This crate scans source files for structs annotated with a `gen:qs`
//! doc-comment marker and generates, per struct, a query-set type with
//! chainable filter/order/CRUD methods and an updater type for partial
//! updates, all backed by an opaque `orm` backend handle.
//!
//! # Example
//!
//! In your `build.rs`:
//!
//! ```ignore
//! fn main() {
//!     queryset_gen::generate_querysets()
//!         .input_file("src/models.rs")
//!         .run()
//!         .expect("Failed to generate query sets");
//!
//!     println!("cargo:rerun-if-changed=src/models.rs");
//! }
//! ```
//!
//! With a model file like:
//!
//! ```ignore
//! /// gen:qs
//! pub struct User {
//!     pub id: i64,
//!     pub name: String,
//! }
//! ```
//!
//! the generated `src/models_queryset.rs` provides `UserQuerySet` with
//! methods such as `name_eq`, `id_lt`, `order_asc_by_name`, `all`, `one`
//! and `count`, plus a `UserUpdater` for field-wise updates.

pub mod builder;
pub mod errors;
pub mod field;
pub mod generator;
pub mod methods;
pub mod parse;
pub mod render;
pub mod tag;

pub use errors::Error;
pub use generator::{QuerySetGenerator, generate_queryset_text};

/// Create a new query-set generator with default settings.
///
/// # Example
///
/// ```ignore
/// queryset_gen::generate_querysets()
///     .scan_path("src/")
///     .run()
///     .expect("Failed to generate query sets");
/// ```
pub fn generate_querysets() -> QuerySetGenerator {
    QuerySetGenerator::new()
}
