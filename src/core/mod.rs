pub mod categorize;
pub mod engine;
pub mod filters;
pub mod periods;
pub mod synthetic;

pub use crate::domain::model::{BreachRecord, BreachReport};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
