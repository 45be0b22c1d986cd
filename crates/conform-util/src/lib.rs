//! conform-util - Utility functions for conform
//!
//! Identity tokens for list items and a memoizing accessor for values that
//! are derived lazily from an immutable snapshot.

pub mod id;
pub mod memo;

pub use id::{generate_id, KeyGenerator, RandomKeys, SeededKeys, SequentialKeys};
pub use memo::Memo;
