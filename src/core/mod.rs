//! Core types and traits shared by the feature, training and evaluation stages

pub mod error;
pub mod traits;
pub mod types;

pub use self::error::*;
pub use self::traits::*;
pub use self::types::*;
