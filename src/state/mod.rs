/// State management module
///
/// This module handles all gallery state, including:
/// - The artwork data model (data.rs)
/// - Error types shared across the state layer (error.rs)
/// - The local key-value storage port and its backends (storage.rs)
/// - The collection store: artworks, filter and selection (collection.rs)
/// - Derived views: filtered list and navigation targets (view.rs)

pub mod collection;
pub mod data;
pub mod error;
pub mod storage;
pub mod view;
