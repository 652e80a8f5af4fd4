pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::toml_config::FigureConfig;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::engine::FigureEngine;
pub use domain::model::{BreachRecord, BreachReport};
pub use domain::ports::{Pipeline, Storage};
pub use utils::error::{FigureError, Result};
