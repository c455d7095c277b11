#![forbid(unsafe_code)]

//! Shared model and logic for the idea validator: prompt assembly, reply
//! normalization, schema checks, report layout and document export.

pub mod api;
pub mod error;
pub mod export;
pub mod model;
pub mod normalize;
pub mod prompt;
pub mod report;
pub mod shape;

pub use error::{ValidatorError, ValidatorResult};
pub use model::*;
pub use normalize::{conform, normalize};
pub use shape::ListPolicy;
