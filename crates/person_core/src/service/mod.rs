//! Use-case services exposed to outer layers.
//!
//! # Responsibility
//! - Offer the repository facade the HTTP layer and scheduler call into.
//! - Keep storage and transport details behind traits.

pub mod person_service;
