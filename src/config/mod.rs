// src/config/mod.rs
pub mod crawler;

pub use crate::config::crawler::{CrawlerConfig, FiltersConfig, ENV_CONFIG_PATH};
