//! Error types for item indexing and mask construction

use thiserror::Error;

/// Errors raised while assigning bit positions to items.
///
/// The solver itself never fails: these are all rejected before a
/// problem instance reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoverError {
    /// The same item name appears twice in the universe.
    #[error("Duplicate item in universe: {0}")]
    DuplicateItem(String),

    /// More items than fit in a single mask word.
    #[error("Universe has {size} items, at most {max} are supported")]
    UniverseTooLarge { size: usize, max: usize },

    /// An item with an empty (or whitespace-only) name.
    #[error("Item names cannot be empty")]
    EmptyItemName,
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, CoverError>;
