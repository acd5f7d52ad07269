//! Local store contracts and their SQLite implementations.
//!
//! # Responsibility
//! - Define the document-style primitives the facade and reconciler need.
//! - Keep SQL inside this module.
//!
//! # Invariants
//! - Writes run `Person::validate()` before touching SQL.
//! - Replace and delete primitives report a match count instead of failing
//!   on "not found"; callers decide what a count means.

pub mod metadata_repo;
pub mod person_repo;
