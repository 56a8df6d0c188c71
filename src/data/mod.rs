//! Dataset loading and class labels
//!
//! Splits are read from `root/<class bucket>/<image>` trees and exposed
//! through the [`Dataset`](crate::core::Dataset) trait.

pub mod labels;
pub mod loader;

pub use self::labels::*;
pub use self::loader::*;
