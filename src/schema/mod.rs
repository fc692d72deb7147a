pub mod types;
pub mod validate;

pub use types::{NameMatching, Schema};
pub use validate::{conform, validate, ValidationResult};
