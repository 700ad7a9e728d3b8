//! # quire-core
//!
//! Core types, traits, and abstractions for the quire knowledge base.
//!
//! This crate provides the foundational data structures, the error taxonomy,
//! and the repository trait definitions that the other quire crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod password;
pub mod search;
pub mod tags;
pub mod traits;
pub mod uuid_utils;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use password::{hash_password, verify_password};
pub use search::{NoteSearchParams, NoteSort, SearchMode};
pub use tags::{normalize_tag_input, normalize_tag_names};
pub use traits::*;
pub use uuid_utils::new_v7;
pub use validation::*;
